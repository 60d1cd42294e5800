use crate::error::{ChartError, Severity};
use crate::theme::Theme;

use super::ErrorLayout;

/// Inline error block for an aborted render. Configuration problems are
/// shown in the theme's error color, data problems in its warning color.
pub fn compute_error_layout(error: &ChartError, theme: &Theme) -> ErrorLayout {
    let severity = error.severity();
    let color = match severity {
        Severity::Configuration => theme.error_color.clone(),
        Severity::Data => theme.warning_color.clone(),
    };
    ErrorLayout {
        severity,
        message: error.to_string(),
        color,
        font_family: theme.label.font_family.clone(),
        font_size: theme.label.font_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Role;

    #[test]
    fn severity_selects_color() {
        let theme = Theme::default();
        let config = compute_error_layout(
            &ChartError::MissingRole {
                role: Role::X,
                available: String::new(),
            },
            &theme,
        );
        assert_eq!(config.color, theme.error_color);
        let data = compute_error_layout(&ChartError::EmptyData, &theme);
        assert_eq!(data.color, theme.warning_color);
        assert_eq!(data.message, "no data rows to render");
    }
}
