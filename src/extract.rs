//! Role resolution and typed row access.
//!
//! Column descriptors are resolved once per render into a [`RoleMap`]; every
//! row is then read through a [`RowAccessor`] instead of by raw key.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ChartError, ChartResult};
use crate::ir::{ColumnDescriptor, Role, Row};
use crate::parser::{parse_date, parse_number};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub unit: Option<String>,
}

/// Field name and unit for each role claimed by a column.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    fields: BTreeMap<Role, ResolvedField>,
}

impl RoleMap {
    pub fn field(&self, role: &Role) -> Option<&ResolvedField> {
        self.fields.get(role)
    }

    pub fn has(&self, role: &Role) -> bool {
        self.fields.contains_key(role)
    }

    pub fn name(&self, role: &Role) -> Option<&str> {
        self.field(role).map(|f| f.name.as_str())
    }

    pub fn unit(&self, role: &Role) -> Option<&str> {
        self.field(role).and_then(|f| f.unit.as_deref())
    }

    /// Forgets roles a chart neither requires nor accepts, so their
    /// columns never reach extraction.
    pub fn restrict(&mut self, required: &[Role], optional: &[Role]) {
        self.fields.retain(|role, field| {
            let used = required.contains(role) || optional.contains(role);
            if !used {
                debug!(role = %role, column = field.name.as_str(), "column role unused by chart");
            }
            used
        });
    }
}

/// Locates the column for every role; fails when a required role is unclaimed.
pub fn extract_roles(columns: &[ColumnDescriptor], required: &[Role]) -> ChartResult<RoleMap> {
    let mut fields: BTreeMap<Role, ResolvedField> = BTreeMap::new();
    for column in columns {
        let Some(role) = column.role.clone() else {
            continue;
        };
        if let Some(existing) = fields.get(&role) {
            warn!(
                role = %role,
                kept = existing.name.as_str(),
                ignored = column.name.as_str(),
                "role claimed by more than one column"
            );
            continue;
        }
        fields.insert(
            role,
            ResolvedField {
                name: column.name.clone(),
                unit: column.display_unit().map(str::to_string),
            },
        );
    }

    for role in required {
        if !fields.contains_key(role) {
            let available = columns
                .iter()
                .map(|c| match &c.role {
                    Some(role) => format!("{} ({})", c.name, role),
                    None => c.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ChartError::MissingRole {
                role: role.clone(),
                available: if available.is_empty() {
                    "none".to_string()
                } else {
                    available
                },
            });
        }
    }

    Ok(RoleMap { fields })
}

/// Typed reads of row values by role.
#[derive(Debug, Clone, Copy)]
pub struct RowAccessor<'a> {
    roles: &'a RoleMap,
}

impl<'a> RowAccessor<'a> {
    pub fn new(roles: &'a RoleMap) -> Self {
        Self { roles }
    }

    pub fn raw<'r>(&self, row: &'r Row, role: &Role) -> Option<&'r Value> {
        let name = self.roles.name(role)?;
        row.get(name).filter(|v| !v.is_null())
    }

    pub fn number(&self, row: &Row, role: &Role) -> Option<f64> {
        match self.raw(row, role)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => parse_number(s),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn category(&self, row: &Row, role: &Role) -> Option<String> {
        let text = match self.raw(row, role)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn date(&self, row: &Row, role: &Role) -> Option<NaiveDateTime> {
        match self.raw(row, role)? {
            Value::String(s) => parse_date(s),
            _ => None,
        }
    }
}

/// Which scale the x role maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxisKind {
    Linear,
    Time,
    Band,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XValue {
    Number(f64),
    Date(NaiveDateTime),
    Category(String),
}

impl XValue {
    /// Position on a continuous axis (seconds for dates).
    pub fn continuous(&self) -> Option<f64> {
        match self {
            XValue::Number(v) => Some(*v),
            XValue::Date(dt) => Some(dt.and_utc().timestamp() as f64),
            XValue::Category(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub x: XValue,
    pub x_label: String,
    pub y: f64,
    pub y2: Option<f64>,
    pub group: Option<String>,
}

/// Typed records for one render plus the ordered category sets.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub roles: RoleMap,
    pub x_kind: XAxisKind,
    pub records: Vec<Record>,
    pub categories: Vec<String>,
    pub groups: Vec<String>,
    pub skipped: usize,
}

impl Extracted {
    pub fn x_title(&self) -> Option<String> {
        axis_title(&self.roles, &Role::X)
    }

    pub fn y_title(&self) -> Option<String> {
        axis_title(&self.roles, &Role::Y)
    }

    pub fn y_unit(&self) -> Option<&str> {
        self.roles.unit(&Role::Y)
    }

    pub fn x_unit(&self) -> Option<&str> {
        self.roles.unit(&Role::X)
    }
}

fn axis_title(roles: &RoleMap, role: &Role) -> Option<String> {
    let field = roles.field(role)?;
    Some(match &field.unit {
        Some(unit) => format!("{} ({})", field.name, unit),
        None => field.name.clone(),
    })
}

/// Reads every row into a [`Record`].
///
/// Rows whose x or y value is missing or unreadable are skipped with a
/// warning; an empty result is an error. `categorical` forces a band x axis.
pub fn extract_records(
    rows: &[Row],
    roles: RoleMap,
    categorical: bool,
    require_group: bool,
) -> ChartResult<Extracted> {
    if rows.is_empty() {
        return Err(ChartError::EmptyData);
    }
    let accessor = RowAccessor::new(&roles);
    let x_kind = if categorical {
        XAxisKind::Band
    } else {
        detect_x_kind(rows, &accessor)
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut categories: Vec<String> = Vec::new();
    let mut groups: Vec<String> = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in rows.iter().enumerate() {
        let x = match x_kind {
            XAxisKind::Linear => accessor.number(row, &Role::X).map(XValue::Number),
            XAxisKind::Time => accessor.date(row, &Role::X).map(XValue::Date),
            XAxisKind::Band => accessor.category(row, &Role::X).map(XValue::Category),
        };
        let Some(x) = x else {
            warn!(row = idx, "skipping row with missing or unreadable x value");
            skipped += 1;
            continue;
        };
        let Some(y) = accessor.number(row, &Role::Y) else {
            warn!(row = idx, "skipping row with missing or non-numeric y value");
            skipped += 1;
            continue;
        };
        let group = accessor.category(row, &Role::Group);
        if require_group && group.is_none() {
            warn!(row = idx, "skipping row with missing group value");
            skipped += 1;
            continue;
        }
        let x_label = accessor.category(row, &Role::X).unwrap_or_default();
        if let XValue::Category(name) = &x
            && !categories.contains(name)
        {
            categories.push(name.clone());
        }
        if let Some(name) = &group
            && !groups.contains(name)
        {
            groups.push(name.clone());
        }
        records.push(Record {
            x,
            x_label,
            y,
            y2: accessor.number(row, &Role::Y2),
            group,
        });
    }

    if records.is_empty() {
        return Err(ChartError::EmptyData);
    }
    if skipped > 0 {
        warn!(skipped, kept = records.len(), "rows skipped during extraction");
    }

    Ok(Extracted {
        roles,
        x_kind,
        records,
        categories,
        groups,
        skipped,
    })
}

fn detect_x_kind(rows: &[Row], accessor: &RowAccessor<'_>) -> XAxisKind {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|row| accessor.raw(row, &Role::X))
        .collect();
    if values.is_empty() {
        return XAxisKind::Band;
    }
    if values.iter().all(|v| v.is_number()) {
        return XAxisKind::Linear;
    }
    let all_dates = values
        .iter()
        .all(|v| v.as_str().map(|s| parse_date(s).is_some()).unwrap_or(false));
    if all_dates {
        XAxisKind::Time
    } else {
        XAxisKind::Band
    }
}
