use std::fmt::Write as _;

use crate::config::LayoutConfig;
use crate::extract::{Record, XAxisKind};
use crate::recipe::ChartKind;

use super::axis::{clamp_to_domain, layout_cartesian};
use super::scale::format_value;
use super::{Frame, Layout, LayoutInput, Primitive};

/// Records of one series in x order.
fn series_points<'a>(input: &'a LayoutInput<'_>, series: Option<&str>) -> Vec<&'a Record> {
    let mut points: Vec<&Record> = input
        .data
        .records
        .iter()
        .filter(|r| series.is_none() || r.group.as_deref() == series)
        .collect();
    if input.data.x_kind != XAxisKind::Band {
        points.sort_by(|a, b| {
            let (a, b) = (a.x.continuous(), b.x.continuous());
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    points
}

pub(super) fn layout_lines(
    input: &LayoutInput<'_>,
    area: Frame,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let data = input.data;
    let is_area = input.recipe.kind == ChartKind::Area;
    let cartesian = layout_cartesian(
        input,
        area,
        data.records.iter().map(|r| r.y).collect(),
        is_area,
        (0.0, 0.0),
        config,
        layout,
    );
    let y = &cartesian.y;
    let baseline = y.map(clamp_to_domain(y, 0.0));
    let unit = data.y_unit();

    let grouped = !data.groups.is_empty();
    for (index, series) in input.series().iter().enumerate() {
        let color = input.series_color(series, index);
        let points: Vec<(f32, f32, &Record)> = series_points(input, grouped.then_some(series.as_str()))
            .into_iter()
            .filter_map(|record| {
                let x = cartesian.x.position(record)?;
                Some((x, y.map(clamp_to_domain(y, record.y)), record))
            })
            .collect();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            continue;
        };

        let mut line = String::new();
        for (idx, (px, py, _)) in points.iter().enumerate() {
            let command = if idx == 0 { 'M' } else { 'L' };
            let _ = write!(line, "{command}{px:.2},{py:.2} ");
        }
        let line = line.trim_end().to_string();

        if is_area {
            let d = format!(
                "{line} L{:.2},{baseline:.2} L{:.2},{baseline:.2} Z",
                last.0, first.0
            );
            layout.marks.push(Primitive::Path {
                d,
                fill: Some(color.clone()),
                stroke: None,
                stroke_width: 0.0,
                opacity: config.area_opacity,
                tooltip: Some(series.clone()),
            });
        }
        layout.marks.push(Primitive::Path {
            d: line,
            fill: None,
            stroke: Some(color.clone()),
            stroke_width: config.line_width,
            opacity: 1.0,
            tooltip: Some(series.clone()),
        });
        for (px, py, record) in &points {
            let label = format_value(record.y, unit);
            layout.marks.push(Primitive::Circle {
                cx: *px,
                cy: *py,
                r: config.point_radius,
                fill: color.clone(),
                stroke: Some(input.style.background.clone()),
                tooltip: Some(if grouped {
                    format!("{} / {}: {}", record.x_label, series, label)
                } else {
                    format!("{}: {}", record.x_label, label)
                }),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::render_chart;
    use crate::config::Config;
    use crate::layout::{Anchor, Layout, Primitive};
    use crate::parser::parse_envelope;
    use crate::recipe::ChartKind;

    fn render(kind: ChartKind, json: &str) -> Layout {
        let envelope = parse_envelope(json).expect("valid envelope");
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        render_chart(kind, &envelope, &config).expect("renders").layout
    }

    fn paths(layout: &Layout) -> Vec<&str> {
        layout
            .marks
            .iter()
            .filter_map(|mark| match mark {
                Primitive::Path { d, .. } => Some(d.as_str()),
                _ => None,
            })
            .collect()
    }

    const SERIES: &str = r#"{
        "data": {
            "data": [
                {"month": "2024-03-01", "visits": 30, "site": "a"},
                {"month": "2024-01-01", "visits": 10, "site": "a"},
                {"month": "2024-02-01", "visits": 20, "site": "a"},
                {"month": "2024-01-01", "visits": 5, "site": "b"}
            ],
            "columns": [
                {"name": "month", "role": "x"},
                {"name": "visits", "role": "y"},
                {"name": "site", "role": "group"}
            ]
        }
    }"#;

    #[test]
    fn one_path_per_series_sorted_by_time() {
        let layout = render(ChartKind::Line, SERIES);
        let lines = paths(&layout);
        assert_eq!(lines.len(), 2);
        let xs: Vec<f32> = lines[0]
            .split(['M', 'L', ' '])
            .filter_map(|part| part.split(',').next()?.parse().ok())
            .collect();
        assert_eq!(xs.len(), 3);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        let markers = layout
            .marks
            .iter()
            .filter(|m| matches!(m, Primitive::Circle { .. }))
            .count();
        assert_eq!(markers, 4);
    }

    #[test]
    fn area_adds_closed_fill_per_series() {
        let layout = render(ChartKind::Area, SERIES);
        let closed = paths(&layout).iter().filter(|d| d.ends_with('Z')).count();
        assert_eq!(closed, 2);
    }

    #[test]
    fn numeric_year_ticks_are_distinct() {
        let layout = render(
            ChartKind::Line,
            r#"{"data": {"data": [
                    {"yr": 2019, "v": 1}, {"yr": 2020, "v": 3},
                    {"yr": 2021, "v": 2}, {"yr": 2022, "v": 5}
                ],
                "columns": [{"name": "yr", "role": "x"}, {"name": "v", "role": "y"}]}}"#,
        );
        let x_ticks: Vec<String> = layout
            .axes
            .iter()
            .filter_map(|p| match p {
                Primitive::Text(mark) if mark.anchor == Anchor::Middle => {
                    mark.block.lines.first().cloned()
                }
                _ => None,
            })
            .filter(|label| label.parse::<f64>().is_ok())
            .collect();
        assert!(x_ticks.len() >= 2);
        assert!(x_ticks.contains(&"2019".to_string()));
        assert!(x_ticks.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn single_point_series_still_renders() {
        let layout = render(
            ChartKind::Line,
            r#"{"data": {"data": [{"x": 1, "y": 7}],
                "columns": [{"name": "x", "role": "x"}, {"name": "y", "role": "y"}]}}"#,
        );
        assert_eq!(paths(&layout).len(), 1);
        assert!(layout.legend.is_empty());
    }
}
