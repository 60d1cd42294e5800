use serde::Deserialize;
use svg_chart_renderer::layout::compute_error_layout;
use svg_chart_renderer::render::render_error_html;
use svg_chart_renderer::theme::Theme;
use svg_chart_renderer::{ChartError, ChartKind, Config, parse_envelope, render_chart, resolve_kind};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRenderOptions {
    theme: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    fast_text: Option<bool>,
}

fn build_config(options: &ChartRenderOptions) -> Config {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        config.render.background = theme.background.clone();
        config.theme = theme;
    }
    if let Some(width) = options.width.filter(|w| *w > 0.0) {
        config.render.width = width;
    }
    if let Some(height) = options.height.filter(|h| *h > 0.0) {
        config.render.height = height;
    }
    // Browsers have no system font database to query.
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    config
}

fn render(envelope_json: &str, kind: Option<&str>, config: &Config) -> Result<String, ChartError> {
    let envelope = parse_envelope(envelope_json)?;
    let explicit = kind
        .filter(|name| !name.trim().is_empty())
        .map(str::parse::<ChartKind>)
        .transpose()?;
    let kind = resolve_kind(explicit, &envelope)?;
    Ok(render_chart(kind, &envelope, config)?.svg)
}

/// Renders an envelope to SVG markup. Failures reject with the inline
/// HTML error block for the caller to display.
#[wasm_bindgen]
pub fn make_chart_svg(
    envelope_json: &str,
    kind: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = match options_json {
        Some(raw_options) => serde_json::from_str::<ChartRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?,
        None => ChartRenderOptions::default(),
    };
    let config = build_config(&options);
    render(envelope_json, kind.as_deref(), &config).map_err(|error| {
        let block = compute_error_layout(&error, &config.theme);
        JsValue::from_str(&render_error_html(&block))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"{
        "data": {
            "data": [{"cat": "A", "val": 10}, {"cat": "B", "val": 20}],
            "columns": [{"name": "cat", "role": "x"}, {"name": "val", "role": "y"}]
        }
    }"#;

    #[test]
    fn renders_with_default_options() {
        let config = build_config(&ChartRenderOptions::default());
        let svg = render(ENVELOPE, Some("pie"), &config).expect("pie renders");
        assert!(svg.contains("chart-pie"));
    }

    #[test]
    fn options_override_canvas() {
        let options: ChartRenderOptions =
            serde_json::from_str(r#"{"theme": "modern", "width": 300}"#).expect("options");
        let config = build_config(&options);
        assert_eq!(config.render.width, 300.0);
        assert_eq!(config.theme.palette, Theme::modern().palette);
    }

    #[test]
    fn unknown_kind_is_a_configuration_error() {
        let config = build_config(&ChartRenderOptions::default());
        let err = render(ENVELOPE, Some("gauge"), &config).expect_err("unknown kind");
        assert!(matches!(err, ChartError::UnknownChartKind(_)));
    }
}
