mod axis;
mod bar;
mod error;
mod legend;
mod line;
mod pie;
pub mod scale;
mod scatter;
pub mod text;
pub(crate) mod types;
pub use error::compute_error_layout;
pub use text::{LabelFit, fallback_text_width, fit_label, measure_label};
pub use types::*;

use crate::config::LayoutConfig;
use crate::extract::Extracted;
use crate::ir::Variables;
use crate::recipe::{ChartKind, Recipe};
use crate::style::{FontStyle, ResolvedStyle};

/// Everything the drawing pass reads for one render.
pub struct LayoutInput<'a> {
    pub recipe: &'a Recipe,
    pub data: &'a Extracted,
    pub variables: &'a Variables,
    pub style: &'a ResolvedStyle,
    pub width: f32,
    pub height: f32,
}

impl LayoutInput<'_> {
    fn gridlines(&self) -> bool {
        self.recipe.show_gridlines && self.variables.show_gridlines.unwrap_or(true)
    }

    fn data_labels(&self) -> bool {
        self.variables
            .show_data_labels
            .unwrap_or(self.recipe.show_data_labels)
    }

    /// Series names in first-appearance order; a single unnamed series
    /// when the chart has no group column.
    fn series(&self) -> Vec<String> {
        if self.data.groups.is_empty() {
            vec![self.data.roles.name(&crate::ir::Role::Y).unwrap_or("value").to_string()]
        } else {
            self.data.groups.clone()
        }
    }

    fn series_color(&self, series: &str, index: usize) -> String {
        if self.data.groups.is_empty() {
            self.style.series_color()
        } else {
            self.style.color_for(series, index)
        }
    }
}

pub fn compute_layout(input: &LayoutInput<'_>, config: &LayoutConfig) -> Layout {
    let mut layout = Layout {
        kind: input.recipe.kind,
        width: input.width,
        height: input.height,
        background: input.style.background.clone(),
        title: None,
        axes: Vec::new(),
        marks: Vec::new(),
        labels: Vec::new(),
        legend: Vec::new(),
    };

    let margin = config.margin;
    let content_width = (input.width - margin.left - margin.right).max(1.0);
    let mut top = margin.top;

    if let Some(title) = input
        .variables
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let font = &input.style.title;
        let lines: Vec<String> = text::split_lines(title)
            .iter()
            .flat_map(|line| text::wrap_line(line, content_width, font, config))
            .collect();
        let block = text::block_from_lines(lines, font, config);
        let height = block.height;
        layout.title = Some(text_mark(
            margin.left + content_width / 2.0,
            top + height / 2.0,
            block,
            font,
            &input.style.text_color,
            Anchor::Middle,
            0.0,
            config,
        ));
        top += height + config.title_gap;
    }

    let entries = legend::legend_entries(input);
    let is_pie = matches!(input.recipe.kind, ChartKind::Pie | ChartKind::Donut);
    let wants_legend = input.recipe.show_legend && input.variables.show_legend.unwrap_or(true);
    if wants_legend && (entries.len() > 1 || (is_pie && !entries.is_empty())) {
        let (primitives, height) =
            legend::layout_legend(&entries, margin.left, top, content_width, input.style, config);
        layout.legend = primitives;
        top += height + config.title_gap;
    }

    let area = Frame {
        x: margin.left,
        y: top,
        width: content_width,
        height: (input.height - margin.bottom - top).max(1.0),
    };
    tracing::debug!(
        kind = %input.recipe.kind,
        records = input.data.records.len(),
        area_width = area.width,
        area_height = area.height,
        "computing chart layout"
    );

    match input.recipe.kind {
        ChartKind::Bar | ChartKind::GroupedBar | ChartKind::StackedBar => {
            bar::layout_vertical_bars(input, area, config, &mut layout)
        }
        ChartKind::HorizontalBar => bar::layout_horizontal_bars(input, area, config, &mut layout),
        ChartKind::Line | ChartKind::Area => line::layout_lines(input, area, config, &mut layout),
        ChartKind::Scatter => scatter::layout_scatter(input, area, config, &mut layout),
        ChartKind::Pie | ChartKind::Donut => pie::layout_pie(input, area, config, &mut layout),
    }

    layout
}

#[allow(clippy::too_many_arguments)]
pub(super) fn text_mark(
    x: f32,
    y: f32,
    block: TextBlock,
    font: &FontStyle,
    fill: &str,
    anchor: Anchor,
    rotation: f32,
    config: &LayoutConfig,
) -> TextMark {
    TextMark {
        x,
        y,
        block,
        font: font.clone(),
        fill: fill.to_string(),
        anchor,
        rotation,
        line_height: text::line_height(font.size, config),
    }
}

/// Text color readable on top of `fill` (hex colors only; others keep `dark`).
pub(super) fn contrast_text(fill: &str, dark: &str) -> String {
    let hex = fill.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return dark.to_string();
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return dark.to_string(),
    };
    let channel = |idx: usize| {
        u8::from_str_radix(&expanded[idx..idx + 2], 16)
            .map(|v| v as f32 / 255.0)
            .ok()
    };
    let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) else {
        return dark.to_string();
    };
    let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    if luminance < 0.55 {
        "#FFFFFF".to_string()
    } else {
        dark.to_string()
    }
}
