use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::extract::{Record, XValue};
use crate::recipe::{ChartKind, FitStrategy};
use crate::style::ResolvedStyle;

use super::axis::{
    Side, XScale, clamp_to_domain, draw_axis, draw_axis_title, draw_gridlines, label_extent,
    layout_cartesian, title_extent, unfitted, value_scale, value_ticks,
};
use super::scale::{BandScale, LinearScale, format_value};
use super::text::{LabelFit, fit_label, line_height};
use super::{Anchor, Frame, Layout, LayoutInput, Primitive, contrast_text, text_mark};

fn category(record: &Record) -> Option<&str> {
    match &record.x {
        XValue::Category(name) => Some(name),
        _ => None,
    }
}

fn tooltip(record: &Record, unit: Option<&str>) -> String {
    let value = format_value(record.y, unit);
    match &record.group {
        Some(group) => format!("{} / {}: {}", record.x_label, group, value),
        None => format!("{}: {}", record.x_label, value),
    }
}

fn bar_color(input: &LayoutInput<'_>, record: &Record) -> String {
    match &record.group {
        Some(group) => {
            let index = input.data.groups.iter().position(|g| g == group).unwrap_or(0);
            input.style.color_for(group, index)
        }
        None => category(record)
            .and_then(|name| input.style.field_color(name))
            .map(str::to_string)
            .unwrap_or_else(|| input.style.series_color()),
    }
}

/// Positive and negative stack totals per category.
fn stack_extents(records: &[Record]) -> Vec<f64> {
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
    for record in records {
        let Some(name) = category(record) else {
            continue;
        };
        let entry = totals.entry(name).or_default();
        if record.y >= 0.0 {
            entry.0 += record.y;
        } else {
            entry.1 += record.y;
        }
    }
    totals.values().flat_map(|(pos, neg)| [*pos, *neg]).collect()
}

pub(super) fn layout_vertical_bars(
    input: &LayoutInput<'_>,
    area: Frame,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let data = input.data;
    let kind = input.recipe.kind;
    let y_values = if kind == ChartKind::StackedBar {
        stack_extents(&data.records)
    } else {
        data.records.iter().map(|r| r.y).collect()
    };
    let cartesian = layout_cartesian(
        input,
        area,
        y_values,
        true,
        (config.band_padding_inner, config.band_padding_outer),
        config,
        layout,
    );
    let XScale::Band(band) = &cartesian.x else {
        return;
    };
    let y = &cartesian.y;
    let unit = data.y_unit();
    let labels = input.data_labels();
    let groups = BandScale::new(
        data.groups.clone(),
        (0.0, band.bandwidth()),
        config.group_padding_inner,
        0.0,
    );
    let mut stacks: HashMap<String, (f64, f64)> = HashMap::new();

    for record in &data.records {
        let Some(name) = category(record) else {
            continue;
        };
        let Some(slot) = band.position(name) else {
            continue;
        };
        let (x, width, from, to) = match (kind, &record.group) {
            (ChartKind::GroupedBar, Some(group)) => {
                let Some(offset) = groups.position(group) else {
                    continue;
                };
                (slot + offset, groups.bandwidth(), 0.0, record.y)
            }
            (ChartKind::StackedBar, _) => {
                let stack = stacks.entry(name.to_string()).or_default();
                let base = if record.y >= 0.0 { &mut stack.0 } else { &mut stack.1 };
                let from = *base;
                *base += record.y;
                (slot, band.bandwidth(), from, *base)
            }
            _ => (slot, band.bandwidth(), 0.0, record.y),
        };
        let y_from = y.map(clamp_to_domain(y, from));
        let y_to = y.map(clamp_to_domain(y, to));
        let fill = bar_color(input, record);
        let bar = BarRect {
            x,
            y: y_from.min(y_to),
            width,
            height: (y_from - y_to).abs(),
        };
        layout.marks.push(Primitive::Rect {
            x: bar.x,
            y: bar.y,
            width: bar.width,
            height: bar.height,
            fill: fill.clone(),
            stroke: None,
            rx: 0.0,
            tooltip: Some(tooltip(record, unit)),
        });

        if labels {
            let text = format_value(record.y, unit);
            if kind == ChartKind::StackedBar {
                push_inside_label(&text, &bar, &fill, input, config, layout);
            } else {
                push_vertical_label(&text, &bar, record.y < 0.0, cartesian.plot, &fill, input, config, layout);
            }
        }
    }
}

struct BarRect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Value label above a bar (below for negative values), moved inside
/// the bar when it would leave the plot.
#[allow(clippy::too_many_arguments)]
fn push_vertical_label(
    text: &str,
    bar: &BarRect,
    negative: bool,
    plot: Frame,
    fill: &str,
    input: &LayoutInput<'_>,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let style = input.style;
    let LabelFit::Fitted {
        block, font_size, ..
    } = fit_label(
        text,
        bar.width + config.data_label_padding,
        None,
        &style.annotation,
        input.recipe.data_label_fit,
        config,
    )
    else {
        return;
    };
    let half = block.height / 2.0;
    let pad = config.data_label_padding;
    let center_x = bar.x + bar.width / 2.0;
    let (mut y, mut color) = if negative {
        (bar.y + bar.height + pad + half, style.text_color.clone())
    } else {
        (bar.y - pad - half, style.text_color.clone())
    };
    if y - half < plot.y || y + half > plot.bottom() {
        if bar.height < block.height + pad * 2.0 {
            return;
        }
        y = if negative {
            bar.y + bar.height - pad - half
        } else {
            bar.y + pad + half
        };
        color = contrast_text(fill, &style.text_color);
    }
    let font = style.annotation.with_size(font_size);
    layout.labels.push(Primitive::Text(text_mark(
        center_x,
        y,
        block,
        &font,
        &color,
        Anchor::Middle,
        0.0,
        config,
    )));
}

/// Value label centered in a stacked segment, omitted when it cannot fit.
fn push_inside_label(
    text: &str,
    bar: &BarRect,
    fill: &str,
    input: &LayoutInput<'_>,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let style = input.style;
    let LabelFit::Fitted {
        block, font_size, ..
    } = fit_label(
        text,
        bar.width,
        None,
        &style.annotation,
        input.recipe.data_label_fit,
        config,
    )
    else {
        return;
    };
    if block.height > bar.height {
        return;
    }
    let font = style.annotation.with_size(font_size);
    layout.labels.push(Primitive::Text(text_mark(
        bar.x + bar.width / 2.0,
        bar.y + bar.height / 2.0,
        block,
        &font,
        &contrast_text(fill, &style.text_color),
        Anchor::Middle,
        0.0,
        config,
    )));
}

/// Category labels beside a horizontal band; wrapped labels taller than
/// their slot fall back to a single truncated line.
fn fit_row_labels(
    band: &BandScale,
    max_width: f32,
    style: &ResolvedStyle,
    strategies: &[FitStrategy],
    config: &LayoutConfig,
) -> Vec<LabelFit> {
    let row = line_height(style.label.size, config);
    band.categories()
        .iter()
        .map(|name| {
            let fit = fit_label(name, max_width, None, &style.label, strategies, config);
            match &fit {
                LabelFit::Fitted { block, .. } if block.height > band.step().max(row) => fit_label(
                    name,
                    max_width,
                    None,
                    &style.label,
                    &[FitStrategy::Truncate],
                    config,
                ),
                _ => fit,
            }
        })
        .collect()
}

pub(super) fn layout_horizontal_bars(
    input: &LayoutInput<'_>,
    area: Frame,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let data = input.data;
    let style = input.style;
    let unit = data.y_unit();

    let values = value_scale(data.records.iter().map(|r| r.y), true, input.variables, config);
    let ticks = value_ticks(&values, unit, config);
    let tick_fits: Vec<LabelFit> = ticks
        .iter()
        .map(|(_, label)| unfitted(label, &style.label, config))
        .collect();
    let show_axes = input.recipe.show_axes;
    let value_title = data.y_title().filter(|_| show_axes);
    let category_title = data.x_title().filter(|_| show_axes);
    let bottom_labels = if show_axes {
        label_extent(Side::Bottom, &tick_fits, config)
    } else {
        0.0
    };
    let bottom = bottom_labels + title_extent(value_title.as_deref(), &style.label, config);
    let plot_height = (area.height - bottom).max(1.0);

    let band = BandScale::new(
        data.categories.clone(),
        (area.y, area.y + plot_height),
        config.band_padding_inner,
        config.band_padding_outer,
    );
    let category_fits = fit_row_labels(
        &band,
        area.width * 0.3,
        style,
        input.recipe.category_label_fit,
        config,
    );
    let left_labels = if show_axes {
        label_extent(Side::Left, &category_fits, config)
    } else {
        0.0
    };
    let left = left_labels + title_extent(category_title.as_deref(), &style.label, config);
    let plot = Frame {
        x: area.x + left,
        y: area.y,
        width: (area.width - left).max(1.0),
        height: plot_height,
    };
    let values = values.with_range((plot.x, plot.right()));

    let tick_positions: Vec<f32> = ticks.iter().map(|(v, _)| values.map(*v)).collect();
    if input.gridlines() {
        draw_gridlines(Side::Bottom, plot, &tick_positions, style, layout);
    }
    if show_axes {
        let bottom_ticks: Vec<(f32, LabelFit)> = tick_positions.into_iter().zip(tick_fits).collect();
        draw_axis(Side::Bottom, plot, &bottom_ticks, style, config, layout);
        let left_ticks: Vec<(f32, LabelFit)> = (0..band.len())
            .map(|idx| band.slot(idx) + band.bandwidth() / 2.0)
            .zip(category_fits)
            .collect();
        draw_axis(Side::Left, plot, &left_ticks, style, config, layout);
    }
    if let Some(title) = value_title.as_deref() {
        draw_axis_title(Side::Bottom, plot, title, bottom_labels + config.axis_title_gap, style, config, layout);
    }
    if let Some(title) = category_title.as_deref() {
        draw_axis_title(Side::Left, plot, title, left_labels + config.axis_title_gap, style, config, layout);
    }

    let labels = input.data_labels();
    for record in &data.records {
        let Some(slot) = category(record).and_then(|name| band.position(name)) else {
            continue;
        };
        let start = values.map(clamp_to_domain(&values, 0.0));
        let end = values.map(clamp_to_domain(&values, record.y));
        let fill = bar_color(input, record);
        layout.marks.push(Primitive::Rect {
            x: start.min(end),
            y: slot,
            width: (end - start).abs(),
            height: band.bandwidth(),
            fill,
            stroke: None,
            rx: 0.0,
            tooltip: Some(tooltip(record, unit)),
        });
        if labels {
            push_horizontal_label(record, end, slot + band.bandwidth() / 2.0, &values, plot, input, config, layout);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn push_horizontal_label(
    record: &Record,
    end: f32,
    center_y: f32,
    values: &LinearScale,
    plot: Frame,
    input: &LayoutInput<'_>,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let style = input.style;
    let pad = config.data_label_padding;
    let negative = record.y < 0.0 && values.domain().0 < 0.0;
    let available = if negative {
        end - plot.x - pad
    } else {
        plot.right() - end - pad
    };
    if available <= 0.0 {
        return;
    }
    let text = format_value(record.y, input.data.y_unit());
    let LabelFit::Fitted {
        block, font_size, ..
    } = fit_label(
        &text,
        available,
        None,
        &style.annotation,
        input.recipe.data_label_fit,
        config,
    )
    else {
        return;
    };
    let (x, anchor) = if negative {
        (end - pad, Anchor::End)
    } else {
        (end + pad, Anchor::Start)
    };
    let font = style.annotation.with_size(font_size);
    layout.labels.push(Primitive::Text(text_mark(
        x,
        center_y,
        block,
        &font,
        &style.text_color,
        anchor,
        0.0,
        config,
    )));
}

#[cfg(test)]
mod tests {
    use crate::chart::render_chart;
    use crate::config::Config;
    use crate::extract::{extract_records, extract_roles};
    use crate::ir::Envelope;
    use crate::layout::{Layout, LayoutInput, Primitive, compute_layout};
    use crate::parser::parse_envelope;
    use crate::recipe::ChartKind;
    use crate::style::ResolvedStyle;

    fn envelope(rows: &str, extra_columns: &str) -> Envelope {
        let json = format!(
            r#"{{
                "data": {{
                    "data": {rows},
                    "columns": [
                        {{"name": "region", "role": "x"}},
                        {{"name": "sales", "role": "y"}}{extra_columns}
                    ]
                }}
            }}"#
        );
        parse_envelope(&json).expect("valid envelope")
    }

    fn render(kind: ChartKind, envelope: &Envelope) -> Layout {
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        render_chart(kind, envelope, &config).expect("renders").layout
    }

    fn rects(layout: &Layout) -> Vec<(f32, f32, f32, f32)> {
        layout
            .marks
            .iter()
            .filter_map(|mark| match mark {
                Primitive::Rect {
                    x, y, width, height, ..
                } => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_bar_per_row_with_tallest_for_largest_value() {
        let env = envelope(
            r#"[{"region": "A", "sales": 10}, {"region": "B", "sales": 20}, {"region": "C", "sales": 5}]"#,
            "",
        );
        let layout = render(ChartKind::Bar, &env);
        let bars = rects(&layout);
        assert_eq!(bars.len(), 3);
        assert!(bars[1].3 > bars[0].3 && bars[0].3 > bars[2].3);
        // Bars share a baseline.
        let base = bars[0].1 + bars[0].3;
        for bar in &bars {
            assert!((bar.1 + bar.3 - base).abs() < 1e-3);
        }
        assert_eq!(layout.labels.len(), 3);
    }

    #[test]
    fn data_labels_can_be_disabled() {
        let mut env = envelope(r#"[{"region": "A", "sales": 10}]"#, "");
        env.variables.show_data_labels = Some(false);
        let layout = render(ChartKind::Bar, &env);
        assert!(layout.labels.is_empty());
    }

    #[test]
    fn horizontal_bars_grow_rightward() {
        let env = envelope(
            r#"[{"region": "North", "sales": 3}, {"region": "South", "sales": 6}]"#,
            "",
        );
        let layout = render(ChartKind::HorizontalBar, &env);
        let bars = rects(&layout);
        assert_eq!(bars.len(), 2);
        assert!((bars[1].2 - bars[0].2 * 2.0).abs() < 1.0);
        assert!(bars[0].1 < bars[1].1);
    }

    #[test]
    fn stacked_segments_do_not_overlap() {
        let env = envelope(
            r#"[
                {"region": "A", "sales": 4, "year": "2023"},
                {"region": "A", "sales": 6, "year": "2024"},
                {"region": "B", "sales": 2, "year": "2023"}
            ]"#,
            r#", {"name": "year", "role": "group"}"#,
        );
        let layout = render(ChartKind::StackedBar, &env);
        let bars = rects(&layout);
        assert_eq!(bars.len(), 3);
        let (first, second) = (bars[0], bars[1]);
        assert!((second.1 + second.3 - first.1).abs() < 1e-3);
        // Two series means a legend.
        assert!(!layout.legend.is_empty());
    }

    #[test]
    fn grouped_bars_sit_side_by_side() {
        let env = envelope(
            r#"[
                {"region": "A", "sales": 4, "year": "2023"},
                {"region": "A", "sales": 6, "year": "2024"}
            ]"#,
            r#", {"name": "year", "role": "group"}"#,
        );
        let layout = render(ChartKind::GroupedBar, &env);
        let bars = rects(&layout);
        assert_eq!(bars.len(), 2);
        assert!(bars[0].0 + bars[0].2 <= bars[1].0 + 1e-3);
    }

    #[test]
    fn axes_follow_recipe_toggle() {
        let env = envelope(r#"[{"region": "A", "sales": 3}, {"region": "B", "sales": 5}]"#, "");
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let style = ResolvedStyle::resolve(&env, &config.theme);
        for kind in [ChartKind::Bar, ChartKind::HorizontalBar] {
            let mut recipe = kind.recipe();
            recipe.show_axes = false;
            recipe.show_gridlines = false;
            let roles = extract_roles(env.columns(), recipe.required_roles).expect("roles");
            let data = extract_records(env.rows(), roles, true, false).expect("records");
            let input = LayoutInput {
                recipe: &recipe,
                data: &data,
                variables: &env.variables,
                style: &style,
                width: 400.0,
                height: 300.0,
            };
            let layout = compute_layout(&input, &config.layout);
            assert!(layout.axes.is_empty(), "{kind} drew axes");
            assert_eq!(rects(&layout).len(), 2);
        }
    }

    #[test]
    fn negative_values_hang_below_baseline() {
        let env = envelope(
            r#"[{"region": "A", "sales": 10}, {"region": "B", "sales": -5}]"#,
            "",
        );
        let layout = render(ChartKind::Bar, &env);
        let bars = rects(&layout);
        let baseline = bars[0].1 + bars[0].3;
        assert!((bars[1].1 - baseline).abs() < 1e-3);
    }
}
