use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One data row: column name to scalar value.
pub type Row = serde_json::Map<String, Value>;

/// Semantic tag assigned to a data column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    X,
    Y,
    Y2,
    Group,
    Group2,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Y2 => "y2",
            Role::Group => "group",
            Role::Group2 => "group2",
            Role::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "x" => Role::X,
            "y" => Role::Y,
            "y2" => Role::Y2,
            "group" => Role::Group,
            "group2" => Role::Group2,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ColumnDescriptor {
    /// Unit to display, `None` when absent or spelled `"none"`.
    pub fn display_unit(&self) -> Option<&str> {
        let unit = self.unit.as_deref()?.trim();
        if unit.is_empty() || unit.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(unit)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

/// Numbers that may arrive either as JSON numbers or as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => crate::parser::parse_css_length(val),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            NumberOrString::Number(val) => format!("{}", val),
            NumberOrString::String(val) => val.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variables {
    #[serde(default)]
    pub width: Option<NumberOrString>,
    #[serde(default)]
    pub height: Option<NumberOrString>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub show_legend: Option<bool>,
    #[serde(default)]
    pub show_data_labels: Option<bool>,
    #[serde(default)]
    pub show_gridlines: Option<bool>,
    #[serde(default)]
    pub y_axis_min: Option<f64>,
    #[serde(default)]
    pub y_axis_max: Option<f64>,
    /// Chart-specific flags this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Variables {
    pub fn width(&self) -> Option<f32> {
        positive(self.width.as_ref()?.as_f32()?)
    }

    pub fn height(&self) -> Option<f32> {
        positive(self.height.as_ref()?.as_f32()?)
    }
}

fn positive(value: f32) -> Option<f32> {
    (value.is_finite() && value > 0.0).then_some(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<NumberOrString>,
    #[serde(default)]
    pub font_weight: Option<NumberOrString>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Typography {
    #[serde(default)]
    pub title: Option<FontSpec>,
    #[serde(default)]
    pub label: Option<FontSpec>,
    #[serde(default)]
    pub annotation: Option<FontSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Colors {
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub other: BTreeMap<String, String>,
    #[serde(default)]
    pub field: BTreeMap<String, String>,
    #[serde(default)]
    pub available_colors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub field: BTreeMap<String, String>,
    #[serde(default)]
    pub other: BTreeMap<String, String>,
}

/// Everything a single render call consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub chart_type: Option<String>,
}

impl Envelope {
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.data.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.data.data
    }
}
