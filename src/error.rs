use thiserror::Error;

use crate::ir::Role;

pub type ChartResult<T> = Result<T, ChartError>;

/// How a fatal render error is presented in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The envelope is structurally unusable (missing roles, bad JSON).
    Configuration,
    /// The envelope is well formed but its data cannot be charted.
    Data,
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("missing required column role '{role}' (available columns: {available})")]
    MissingRole { role: Role, available: String },

    #[error("no data rows to render")]
    EmptyData,

    #[error("{what} count {count} is outside the supported range {min}..={max}")]
    UnsupportedCount {
        what: &'static str,
        count: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid chart envelope: {0}")]
    InvalidEnvelope(String),

    #[error("unknown chart type '{0}'")]
    UnknownChartKind(String),
}

impl ChartError {
    pub fn severity(&self) -> Severity {
        match self {
            ChartError::MissingRole { .. }
            | ChartError::InvalidEnvelope(_)
            | ChartError::UnknownChartKind(_) => Severity::Configuration,
            ChartError::EmptyData | ChartError::UnsupportedCount { .. } => Severity::Data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_splits_config_and_data_errors() {
        let missing = ChartError::MissingRole {
            role: Role::Y,
            available: "cat".to_string(),
        };
        assert_eq!(missing.severity(), Severity::Configuration);
        assert_eq!(ChartError::EmptyData.severity(), Severity::Data);
    }

    #[test]
    fn missing_role_message_names_role() {
        let err = ChartError::MissingRole {
            role: Role::Group,
            available: "a, b".to_string(),
        };
        assert!(err.to_string().contains("'group'"));
    }
}
