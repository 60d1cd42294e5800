use crate::ir::NumberOrString;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 24.0,
            bottom: 20.0,
            left: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub margin: Margins,
    pub band_padding_inner: f32,
    pub band_padding_outer: f32,
    pub group_padding_inner: f32,
    pub tick_count: usize,
    pub tick_size: f32,
    pub tick_padding: f32,
    pub axis_title_gap: f32,
    pub label_line_height: f32,
    pub max_label_lines: usize,
    pub min_font_size: f32,
    pub rotated_label_angle: f32,
    pub title_gap: f32,
    pub legend_swatch_size: f32,
    pub legend_item_gap: f32,
    pub legend_row_gap: f32,
    pub legend_text_gap: f32,
    pub donut_inner_ratio: f32,
    pub pie_label_min_percent: f32,
    pub point_radius: f32,
    pub bubble_min_radius: f32,
    pub bubble_max_radius: f32,
    pub line_width: f32,
    pub area_opacity: f32,
    pub data_label_padding: f32,
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: Margins::default(),
            band_padding_inner: 0.2,
            band_padding_outer: 0.1,
            group_padding_inner: 0.05,
            tick_count: 5,
            tick_size: 6.0,
            tick_padding: 4.0,
            axis_title_gap: 8.0,
            label_line_height: 1.2,
            max_label_lines: 2,
            min_font_size: 8.0,
            rotated_label_angle: -45.0,
            title_gap: 12.0,
            legend_swatch_size: 12.0,
            legend_item_gap: 16.0,
            legend_row_gap: 6.0,
            legend_text_gap: 6.0,
            donut_inner_ratio: 0.55,
            pie_label_min_percent: 4.0,
            point_radius: 3.5,
            bubble_min_radius: 3.0,
            bubble_max_radius: 24.0,
            line_width: 2.0,
            area_opacity: 0.3,
            data_label_padding: 4.0,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    title_font_size: Option<NumberOrString>,
    label_font_size: Option<NumberOrString>,
    annotation_font_size: Option<NumberOrString>,
    text_color: Option<String>,
    background: Option<String>,
    axis_color: Option<String>,
    grid_color: Option<String>,
    palette: Option<Vec<String>>,
    slice_stroke: Option<String>,
    error_color: Option<String>,
    warning_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MarginsFile {
    top: Option<f32>,
    right: Option<f32>,
    bottom: Option<f32>,
    left: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    margin: Option<MarginsFile>,
    band_padding_inner: Option<f32>,
    band_padding_outer: Option<f32>,
    group_padding_inner: Option<f32>,
    tick_count: Option<usize>,
    tick_size: Option<f32>,
    tick_padding: Option<f32>,
    axis_title_gap: Option<f32>,
    label_line_height: Option<f32>,
    max_label_lines: Option<usize>,
    min_font_size: Option<f32>,
    rotated_label_angle: Option<f32>,
    title_gap: Option<f32>,
    legend_swatch_size: Option<f32>,
    legend_item_gap: Option<f32>,
    legend_row_gap: Option<f32>,
    legend_text_gap: Option<f32>,
    donut_inner_ratio: Option<f32>,
    pie_label_min_percent: Option<f32>,
    point_radius: Option<f32>,
    bubble_min_radius: Option<f32>,
    bubble_max_radius: Option<f32>,
    line_width: Option<f32>,
    area_opacity: Option<f32>,
    data_label_padding: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(&contents)?,
    };
    Ok(apply_config_file(Config::default(), parsed))
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Config {
    if let Some(name) = parsed.theme.as_deref() {
        match Theme::by_name(name) {
            Some(theme) => {
                config.render.background = theme.background.clone();
                config.theme = theme;
            }
            None => tracing::warn!(theme = name, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.title.font_family = v.clone();
            theme.label.font_family = v.clone();
            theme.annotation.font_family = v;
        }
        if let Some(v) = vars.title_font_size.as_ref().and_then(NumberOrString::as_f32) {
            theme.title.font_size = v;
        }
        if let Some(v) = vars.label_font_size.as_ref().and_then(NumberOrString::as_f32) {
            theme.label.font_size = v;
        }
        if let Some(v) = vars
            .annotation_font_size
            .as_ref()
            .and_then(NumberOrString::as_f32)
        {
            theme.annotation.font_size = v;
        }
        if let Some(v) = vars.text_color {
            theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            theme.background = v;
        }
        if let Some(v) = vars.axis_color {
            theme.axis_color = v;
        }
        if let Some(v) = vars.grid_color {
            theme.grid_color = v;
        }
        if let Some(v) = vars.palette.filter(|p| !p.is_empty()) {
            theme.palette = v;
        }
        if let Some(v) = vars.slice_stroke {
            theme.slice_stroke = v;
        }
        if let Some(v) = vars.error_color {
            theme.error_color = v;
        }
        if let Some(v) = vars.warning_color {
            theme.warning_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let cfg = &mut config.layout;
        if let Some(margin) = layout.margin {
            if let Some(v) = margin.top {
                cfg.margin.top = v;
            }
            if let Some(v) = margin.right {
                cfg.margin.right = v;
            }
            if let Some(v) = margin.bottom {
                cfg.margin.bottom = v;
            }
            if let Some(v) = margin.left {
                cfg.margin.left = v;
            }
        }
        if let Some(v) = layout.band_padding_inner {
            cfg.band_padding_inner = v;
        }
        if let Some(v) = layout.band_padding_outer {
            cfg.band_padding_outer = v;
        }
        if let Some(v) = layout.group_padding_inner {
            cfg.group_padding_inner = v;
        }
        if let Some(v) = layout.tick_count {
            cfg.tick_count = v.max(2);
        }
        if let Some(v) = layout.tick_size {
            cfg.tick_size = v;
        }
        if let Some(v) = layout.tick_padding {
            cfg.tick_padding = v;
        }
        if let Some(v) = layout.axis_title_gap {
            cfg.axis_title_gap = v;
        }
        if let Some(v) = layout.label_line_height {
            cfg.label_line_height = v;
        }
        if let Some(v) = layout.max_label_lines {
            cfg.max_label_lines = v.max(1);
        }
        if let Some(v) = layout.min_font_size {
            cfg.min_font_size = v;
        }
        if let Some(v) = layout.rotated_label_angle {
            cfg.rotated_label_angle = v;
        }
        if let Some(v) = layout.title_gap {
            cfg.title_gap = v;
        }
        if let Some(v) = layout.legend_swatch_size {
            cfg.legend_swatch_size = v;
        }
        if let Some(v) = layout.legend_item_gap {
            cfg.legend_item_gap = v;
        }
        if let Some(v) = layout.legend_row_gap {
            cfg.legend_row_gap = v;
        }
        if let Some(v) = layout.legend_text_gap {
            cfg.legend_text_gap = v;
        }
        if let Some(v) = layout.donut_inner_ratio {
            cfg.donut_inner_ratio = v.clamp(0.0, 0.95);
        }
        if let Some(v) = layout.pie_label_min_percent {
            cfg.pie_label_min_percent = v;
        }
        if let Some(v) = layout.point_radius {
            cfg.point_radius = v;
        }
        if let Some(v) = layout.bubble_min_radius {
            cfg.bubble_min_radius = v;
        }
        if let Some(v) = layout.bubble_max_radius {
            cfg.bubble_max_radius = v;
        }
        if let Some(v) = layout.line_width {
            cfg.line_width = v;
        }
        if let Some(v) = layout.area_opacity {
            cfg.area_opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = layout.data_label_padding {
            cfg.data_label_padding = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            cfg.fast_text_metrics = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.render.width, 800.0);
        assert_eq!(config.render.height, 600.0);
        assert_eq!(config.layout.tick_count, 5);
    }

    #[test]
    fn overlays_theme_and_layout_fields() {
        let parsed: ConfigFile = serde_json::from_str(
            r##"{
                "theme": "modern",
                "themeVariables": {"labelFontSize": "14px", "palette": ["#111111"]},
                "layout": {"tickCount": 1, "donutInnerRatio": 2.0, "margin": {"left": 40}},
                "render": {"width": 1024}
            }"##,
        )
        .expect("config file");
        let config = apply_config_file(Config::default(), parsed);
        assert_eq!(config.theme.label.font_size, 14.0);
        assert_eq!(config.theme.palette, vec!["#111111".to_string()]);
        assert_eq!(config.theme.text_color, Theme::modern().text_color);
        assert_eq!(config.layout.tick_count, 2);
        assert_eq!(config.layout.donut_inner_ratio, 0.95);
        assert_eq!(config.layout.margin.left, 40.0);
        assert_eq!(config.render.width, 1024.0);
    }

    #[test]
    fn overlays_spacing_fields() {
        let parsed: ConfigFile = serde_json::from_str(
            r#"{"layout": {
                "tickPadding": 7, "axisTitleGap": 11, "titleGap": 20,
                "legendItemGap": 9, "legendRowGap": 3, "legendTextGap": 2,
                "dataLabelPadding": 5
            }}"#,
        )
        .expect("config file");
        let layout = apply_config_file(Config::default(), parsed).layout;
        assert_eq!(layout.tick_padding, 7.0);
        assert_eq!(layout.axis_title_gap, 11.0);
        assert_eq!(layout.title_gap, 20.0);
        assert_eq!(layout.legend_item_gap, 9.0);
        assert_eq!(layout.legend_row_gap, 3.0);
        assert_eq!(layout.legend_text_gap, 2.0);
        assert_eq!(layout.data_label_padding, 5.0);
    }

    #[test]
    fn loads_json5_files() {
        let dir = std::env::temp_dir().join(format!("chartr-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.json5");
        std::fs::write(&path, "{ render: { height: 300, }, // trailing\n }").expect("write");
        let config = load_config(Some(&path)).expect("json5 config");
        assert_eq!(config.render.height, 300.0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
