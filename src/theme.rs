use serde::{Deserialize, Serialize};

const TABLEAU_PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

const MODERN_PALETTE: [&str; 10] = [
    "#3B82F6", "#F59E0B", "#10B981", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
    "#6366F1", "#84CC16",
];

/// Font defaults for one typography role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDefaults {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
}

/// The shared default-configuration table every chart recipe reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub title: FontDefaults,
    pub label: FontDefaults,
    pub annotation: FontDefaults,
    pub text_color: String,
    pub background: String,
    pub axis_color: String,
    pub grid_color: String,
    pub palette: Vec<String>,
    pub slice_stroke: String,
    pub error_color: String,
    pub warning_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        let family = "\"Helvetica Neue\", Helvetica, Arial, sans-serif".to_string();
        Self {
            title: FontDefaults {
                font_family: family.clone(),
                font_size: 18.0,
                font_weight: 700,
            },
            label: FontDefaults {
                font_family: family.clone(),
                font_size: 12.0,
                font_weight: 400,
            },
            annotation: FontDefaults {
                font_family: family,
                font_size: 11.0,
                font_weight: 400,
            },
            text_color: "#333333".to_string(),
            background: "#FFFFFF".to_string(),
            axis_color: "#666666".to_string(),
            grid_color: "#E5E5E5".to_string(),
            palette: TABLEAU_PALETTE.iter().map(|c| c.to_string()).collect(),
            slice_stroke: "#FFFFFF".to_string(),
            error_color: "#D32F2F".to_string(),
            warning_color: "#ED6C02".to_string(),
        }
    }

    pub fn modern() -> Self {
        let family = "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string();
        Self {
            title: FontDefaults {
                font_family: family.clone(),
                font_size: 16.0,
                font_weight: 600,
            },
            label: FontDefaults {
                font_family: family.clone(),
                font_size: 12.0,
                font_weight: 400,
            },
            annotation: FontDefaults {
                font_family: family,
                font_size: 11.0,
                font_weight: 500,
            },
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            axis_color: "#7A8AA6".to_string(),
            grid_color: "#EEF2F8".to_string(),
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
            slice_stroke: "#FFFFFF".to_string(),
            error_color: "#D32F2F".to_string(),
            warning_color: "#ED6C02".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "modern" => Some(Self::modern()),
            "classic" | "default" | "base" => Some(Self::classic()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
