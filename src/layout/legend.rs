use crate::config::LayoutConfig;
use crate::recipe::{ChartKind, FitStrategy};
use crate::style::ResolvedStyle;

use super::text::{LabelFit, fit_label, line_height};
use super::{Anchor, LayoutInput, Primitive, TextBlock, text_mark};

const LABEL_FIT: &[FitStrategy] = &[FitStrategy::Truncate];

#[derive(Debug, Clone, PartialEq)]
pub(super) struct LegendEntry {
    pub label: String,
    pub color: String,
    pub icon: Option<String>,
}

/// One entry per series, or per slice for pie charts.
pub(super) fn legend_entries(input: &LayoutInput<'_>) -> Vec<LegendEntry> {
    let names: &[String] = match input.recipe.kind {
        ChartKind::Pie | ChartKind::Donut => &input.data.categories,
        _ => &input.data.groups,
    };
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| LegendEntry {
            label: name.clone(),
            color: input.style.color_for(name, idx),
            icon: input.style.icon_for(name).map(str::to_string),
        })
        .collect()
}

struct Item<'a> {
    entry: &'a LegendEntry,
    block: TextBlock,
    font_size: f32,
    width: f32,
}

/// Lays entries out left to right, wrapping into centered rows that fit
/// `width`. Returns the primitives and the height consumed.
pub(super) fn layout_legend(
    entries: &[LegendEntry],
    x: f32,
    y: f32,
    width: f32,
    style: &ResolvedStyle,
    config: &LayoutConfig,
) -> (Vec<Primitive>, f32) {
    let swatch = config.legend_swatch_size;
    let max_label = (width * 0.4 - swatch - config.legend_text_gap).max(1.0);
    let items: Vec<Item<'_>> = entries
        .iter()
        .filter_map(|entry| {
            match fit_label(&entry.label, max_label, None, &style.label, LABEL_FIT, config) {
                LabelFit::Fitted {
                    block, font_size, ..
                } => Some(Item {
                    entry,
                    width: swatch + config.legend_text_gap + block.width,
                    block,
                    font_size,
                }),
                LabelFit::Omitted => None,
            }
        })
        .collect();
    if items.is_empty() {
        return (Vec::new(), 0.0);
    }

    let mut rows: Vec<Vec<Item<'_>>> = Vec::new();
    let mut row_width = 0.0;
    for item in items {
        let needed = if row_width > 0.0 {
            row_width + config.legend_item_gap + item.width
        } else {
            item.width
        };
        match rows.last_mut() {
            Some(row) if needed <= width => {
                row_width = needed;
                row.push(item);
            }
            _ => {
                row_width = item.width;
                rows.push(vec![item]);
            }
        }
    }

    let row_height = swatch.max(line_height(style.label.size, config));
    let mut primitives = Vec::new();
    let mut cursor_y = y;
    for row in &rows {
        let used: f32 = row.iter().map(|item| item.width).sum::<f32>()
            + config.legend_item_gap * (row.len().saturating_sub(1)) as f32;
        let mut cursor_x = x + ((width - used) / 2.0).max(0.0);
        let middle = cursor_y + row_height / 2.0;
        for item in row {
            let top = middle - swatch / 2.0;
            primitives.push(match &item.entry.icon {
                Some(href) => Primitive::Image {
                    x: cursor_x,
                    y: top,
                    width: swatch,
                    height: swatch,
                    href: href.clone(),
                },
                None => Primitive::Rect {
                    x: cursor_x,
                    y: top,
                    width: swatch,
                    height: swatch,
                    fill: item.entry.color.clone(),
                    stroke: None,
                    rx: 2.0,
                    tooltip: None,
                },
            });
            let font = style.label.with_size(item.font_size);
            primitives.push(Primitive::Text(text_mark(
                cursor_x + swatch + config.legend_text_gap,
                middle,
                item.block.clone(),
                &font,
                &style.text_color,
                Anchor::Start,
                0.0,
                config,
            )));
            cursor_x += item.width + config.legend_item_gap;
        }
        cursor_y += row_height + config.legend_row_gap;
    }
    let height = rows.len() as f32 * row_height + (rows.len() - 1) as f32 * config.legend_row_gap;
    (primitives, height)
}
