use crate::config::LayoutConfig;
use crate::extract::Record;

use super::axis::{clamp_to_domain, layout_cartesian};
use super::scale::format_value;
use super::{Frame, Layout, LayoutInput, Primitive};

/// Area-proportional bubble radius for `value` in `[0, max]`.
fn bubble_radius(value: f64, max: f64, config: &LayoutConfig) -> f32 {
    if max <= 0.0 || !value.is_finite() {
        return config.bubble_min_radius;
    }
    let t = (value.max(0.0) / max).sqrt() as f32;
    config.bubble_min_radius + t * (config.bubble_max_radius - config.bubble_min_radius)
}

fn tooltip(record: &Record, input: &LayoutInput<'_>) -> String {
    let mut text = format!(
        "{}: {}",
        record.x_label,
        format_value(record.y, input.data.y_unit())
    );
    if let Some(size) = record.y2 {
        text.push_str(&format!(" ({})", format_value(size, None)));
    }
    if let Some(group) = &record.group {
        text = format!("{group} / {text}");
    }
    text
}

pub(super) fn layout_scatter(
    input: &LayoutInput<'_>,
    area: Frame,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let data = input.data;
    let cartesian = layout_cartesian(
        input,
        area,
        data.records.iter().map(|r| r.y).collect(),
        false,
        (0.0, 0.0),
        config,
        layout,
    );
    let y = &cartesian.y;
    let max_size = data
        .records
        .iter()
        .filter_map(|r| r.y2)
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let sized = data.records.iter().any(|r| r.y2.is_some());

    let mut points: Vec<(f32, Primitive)> = Vec::with_capacity(data.records.len());
    for record in &data.records {
        let Some(cx) = cartesian.x.position(record) else {
            continue;
        };
        let r = match record.y2 {
            Some(size) if sized => bubble_radius(size, max_size, config),
            _ => config.point_radius,
        };
        let fill = match &record.group {
            Some(group) => {
                let index = data.groups.iter().position(|g| g == group).unwrap_or(0);
                input.series_color(group, index)
            }
            None => input.style.series_color(),
        };
        points.push((
            r,
            Primitive::Circle {
                cx,
                cy: y.map(clamp_to_domain(y, record.y)),
                r,
                fill,
                stroke: Some(input.style.background.clone()),
                tooltip: Some(tooltip(record, input)),
            },
        ));
    }
    // Large bubbles first so small ones stay visible on top.
    if sized {
        points.sort_by(|a, b| b.0.total_cmp(&a.0));
    }
    layout.marks.extend(points.into_iter().map(|(_, circle)| circle));
}
