use crate::config::LayoutConfig;
use crate::extract::{Extracted, Record, XAxisKind, XValue};
use crate::ir::Variables;
use crate::recipe::FitStrategy;
use crate::style::{FontStyle, ResolvedStyle};

use super::scale::{BandScale, LinearScale, TimeScale, tick_labels};
use super::text::{self, LabelFit, fit_label, force_rotation, line_height, measure_label};
use super::{Anchor, Frame, Layout, LayoutInput, Primitive, text_mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    Bottom,
    Left,
}

/// Horizontal mapping for cartesian charts, chosen from the x values.
#[derive(Debug, Clone)]
pub(super) enum XScale {
    Linear(LinearScale),
    Time(TimeScale),
    Band(BandScale),
}

impl XScale {
    pub(super) fn build(
        data: &Extracted,
        range: (f32, f32),
        band_padding: (f32, f32),
        config: &LayoutConfig,
    ) -> Self {
        let continuous = || data.records.iter().filter_map(|r| r.x.continuous());
        match data.x_kind {
            XAxisKind::Linear => XScale::Linear(
                LinearScale::from_values(continuous(), false, range).nice(config.tick_count),
            ),
            XAxisKind::Time => XScale::Time(TimeScale::from_seconds(continuous(), range)),
            XAxisKind::Band => XScale::Band(BandScale::new(
                data.categories.clone(),
                range,
                band_padding.0,
                band_padding.1,
            )),
        }
    }

    pub(super) fn position(&self, record: &Record) -> Option<f32> {
        match (self, &record.x) {
            (XScale::Band(band), XValue::Category(name)) => band.center(name),
            (XScale::Linear(scale), x) => x.continuous().map(|v| scale.map(v)),
            (XScale::Time(scale), x) => x.continuous().map(|v| scale.map_seconds(v)),
            _ => None,
        }
    }

    /// Tick positions with their unfitted labels.
    pub(super) fn ticks(&self, unit: Option<&str>, config: &LayoutConfig) -> Vec<(f32, String)> {
        match self {
            XScale::Linear(scale) => {
                let values = scale.ticks(config.tick_count);
                let labels = tick_labels(&values, scale.tick_step(config.tick_count), unit);
                values
                    .into_iter()
                    .map(|v| scale.map(v))
                    .zip(labels)
                    .collect()
            }
            XScale::Time(scale) => scale
                .ticks(config.tick_count)
                .into_iter()
                .map(|(s, label)| (scale.map_seconds(s), label))
                .collect(),
            XScale::Band(band) => band
                .categories()
                .iter()
                .enumerate()
                .map(|(idx, name)| (band.slot(idx) + band.bandwidth() / 2.0, name.clone()))
                .collect(),
        }
    }

    /// Width available to one tick label.
    pub(super) fn slot_width(&self, plot_width: f32, tick_count: usize) -> f32 {
        match self {
            XScale::Band(band) => band.step(),
            _ => plot_width / tick_count.max(1) as f32,
        }
    }
}

/// Value scale over `values`, extended to whole ticks, then pinned to
/// the caller's `yAxisMin` / `yAxisMax` when given.
pub(super) fn value_scale(
    values: impl IntoIterator<Item = f64>,
    include_zero: bool,
    variables: &Variables,
    config: &LayoutConfig,
) -> LinearScale {
    let scale = LinearScale::from_values(values, include_zero, (0.0, 1.0)).nice(config.tick_count);
    let (mut lo, mut hi) = scale.domain();
    if let Some(min) = variables.y_axis_min.filter(|v| v.is_finite()) {
        lo = min;
    }
    if let Some(max) = variables.y_axis_max.filter(|v| v.is_finite()) {
        hi = max;
    }
    LinearScale::new((lo, hi), (0.0, 1.0))
}

/// Clamps `value` into the scale's domain so overridden bounds clip marks.
pub(super) fn clamp_to_domain(scale: &LinearScale, value: f64) -> f64 {
    let (lo, hi) = scale.domain();
    value.clamp(lo, hi)
}

pub(super) fn value_ticks(
    scale: &LinearScale,
    unit: Option<&str>,
    config: &LayoutConfig,
) -> Vec<(f64, String)> {
    let values = scale.ticks(config.tick_count);
    let labels = tick_labels(&values, scale.tick_step(config.tick_count), unit);
    values.into_iter().zip(labels).collect()
}

pub(super) fn unfitted(label: &str, font: &FontStyle, config: &LayoutConfig) -> LabelFit {
    LabelFit::Fitted {
        block: measure_label(label, font, config),
        font_size: font.size,
        rotation: 0.0,
    }
}

/// Fits a row of tick labels. Once one label needs rotation, every
/// label is rotated so the row reads uniformly.
pub(super) fn fit_tick_labels(
    labels: &[String],
    max_width: f32,
    max_height: Option<f32>,
    font: &FontStyle,
    strategies: &[FitStrategy],
    config: &LayoutConfig,
) -> Vec<LabelFit> {
    let fits: Vec<LabelFit> = labels
        .iter()
        .map(|label| fit_label(label, max_width, max_height, font, strategies, config))
        .collect();
    let rotated = fits
        .iter()
        .any(|fit| matches!(fit, LabelFit::Fitted { rotation, .. } if *rotation != 0.0));
    if !rotated {
        return fits;
    }
    labels
        .iter()
        .map(|label| {
            force_rotation(label, max_width, max_height, font, config).unwrap_or(LabelFit::Omitted)
        })
        .collect()
}

/// Space between the plot edge and the outer edge of the tick labels.
pub(super) fn label_extent(side: Side, fits: &[LabelFit], config: &LayoutConfig) -> f32 {
    let labels = fits
        .iter()
        .map(|fit| match side {
            Side::Bottom => fit.footprint_height(),
            Side::Left => fit.footprint_width(),
        })
        .fold(0.0, f32::max);
    config.tick_size + config.tick_padding + labels
}

pub(super) fn title_extent(title: Option<&str>, font: &FontStyle, config: &LayoutConfig) -> f32 {
    match title {
        Some(_) => line_height(font.size, config) + config.axis_title_gap,
        None => 0.0,
    }
}

pub(super) fn draw_axis(
    side: Side,
    plot: Frame,
    ticks: &[(f32, LabelFit)],
    style: &ResolvedStyle,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let stroke = style.axis_color.clone();
    let domain = match side {
        Side::Bottom => (plot.x, plot.bottom(), plot.right(), plot.bottom()),
        Side::Left => (plot.x, plot.y, plot.x, plot.bottom()),
    };
    layout.axes.push(Primitive::Line {
        x1: domain.0,
        y1: domain.1,
        x2: domain.2,
        y2: domain.3,
        stroke: stroke.clone(),
        stroke_width: 1.0,
        dash: None,
    });

    let offset = config.tick_size + config.tick_padding;
    for (position, fit) in ticks {
        let (x1, y1, x2, y2) = match side {
            Side::Bottom => (*position, plot.bottom(), *position, plot.bottom() + config.tick_size),
            Side::Left => (plot.x - config.tick_size, *position, plot.x, *position),
        };
        layout.axes.push(Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: stroke.clone(),
            stroke_width: 1.0,
            dash: None,
        });

        let LabelFit::Fitted {
            block,
            font_size,
            rotation,
        } = fit
        else {
            continue;
        };
        let font = style.label.with_size(*font_size);
        let mark = match side {
            Side::Bottom if *rotation != 0.0 => {
                let row = line_height(*font_size, config);
                let anchor = if *rotation < 0.0 { Anchor::End } else { Anchor::Start };
                let y = plot.bottom() + offset + row / 2.0 * rotation.to_radians().cos().abs();
                text_mark(*position, y, block.clone(), &font, &style.text_color, anchor, *rotation, config)
            }
            Side::Bottom => text_mark(
                *position,
                plot.bottom() + offset + block.height / 2.0,
                block.clone(),
                &font,
                &style.text_color,
                Anchor::Middle,
                0.0,
                config,
            ),
            Side::Left => text_mark(
                plot.x - offset,
                *position,
                block.clone(),
                &font,
                &style.text_color,
                Anchor::End,
                0.0,
                config,
            ),
        };
        layout.axes.push(Primitive::Text(mark));
    }
}

/// Gridlines across the plot at value-axis tick positions.
pub(super) fn draw_gridlines(side: Side, plot: Frame, positions: &[f32], style: &ResolvedStyle, layout: &mut Layout) {
    for position in positions {
        let (x1, y1, x2, y2) = match side {
            Side::Left => (plot.x, *position, plot.right(), *position),
            Side::Bottom => (*position, plot.y, *position, plot.bottom()),
        };
        layout.axes.push(Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: style.grid_color.clone(),
            stroke_width: 1.0,
            dash: Some("2,2".to_string()),
        });
    }
}

/// Axis title placed `offset` pixels outside the plot edge.
pub(super) fn draw_axis_title(
    side: Side,
    plot: Frame,
    title: &str,
    offset: f32,
    style: &ResolvedStyle,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let font = &style.label;
    let length = match side {
        Side::Bottom => plot.width,
        Side::Left => plot.height,
    };
    let Some(line) = text::truncate_to_width(title, length, font, config) else {
        return;
    };
    let block = text::block_from_lines(vec![line], font, config);
    let half = line_height(font.size, config) / 2.0;
    let mark = match side {
        Side::Bottom => text_mark(
            plot.x + plot.width / 2.0,
            plot.bottom() + offset + half,
            block,
            font,
            &style.text_color,
            Anchor::Middle,
            0.0,
            config,
        ),
        Side::Left => text_mark(
            plot.x - offset - half,
            plot.y + plot.height / 2.0,
            block,
            font,
            &style.text_color,
            Anchor::Middle,
            -90.0,
            config,
        ),
    };
    layout.axes.push(Primitive::Text(mark));
}

/// Plot frame and scales shared by the vertical cartesian charts.
pub(super) struct Cartesian {
    pub plot: Frame,
    pub x: XScale,
    pub y: LinearScale,
}

/// Sizes the gutters from measured tick labels, then draws both axes,
/// their titles and the horizontal gridlines.
pub(super) fn layout_cartesian(
    input: &LayoutInput<'_>,
    area: Frame,
    y_values: Vec<f64>,
    include_zero: bool,
    band_padding: (f32, f32),
    config: &LayoutConfig,
    layout: &mut Layout,
) -> Cartesian {
    let style = input.style;
    let data = input.data;
    let y = value_scale(y_values, include_zero, input.variables, config);
    let y_ticks = value_ticks(&y, data.y_unit(), config);
    let y_fits: Vec<LabelFit> = y_ticks
        .iter()
        .map(|(_, label)| unfitted(label, &style.label, config))
        .collect();

    let show_axes = input.recipe.show_axes;
    let y_title = data.y_title().filter(|_| show_axes);
    let x_title = data.x_title().filter(|_| show_axes);
    let left_labels = if show_axes {
        label_extent(Side::Left, &y_fits, config)
    } else {
        0.0
    };
    let left = left_labels + title_extent(y_title.as_deref(), &style.label, config);
    let plot_x = area.x + left;
    let plot_width = (area.width - left).max(1.0);

    let x = XScale::build(data, (plot_x, plot_x + plot_width), band_padding, config);
    let x_ticks = x.ticks(data.x_unit(), config);
    let labels: Vec<String> = x_ticks.iter().map(|(_, label)| label.clone()).collect();
    let x_fits = fit_tick_labels(
        &labels,
        x.slot_width(plot_width, x_ticks.len()),
        Some(area.height * 0.35),
        &style.label,
        input.recipe.category_label_fit,
        config,
    );
    let bottom_labels = if show_axes {
        label_extent(Side::Bottom, &x_fits, config)
    } else {
        0.0
    };
    let bottom = bottom_labels + title_extent(x_title.as_deref(), &style.label, config);

    let plot = Frame {
        x: plot_x,
        y: area.y,
        width: plot_width,
        height: (area.height - bottom).max(1.0),
    };
    let y = y.with_range((plot.bottom(), plot.y));

    let y_positions: Vec<f32> = y_ticks.iter().map(|(v, _)| y.map(*v)).collect();
    if input.gridlines() {
        draw_gridlines(Side::Left, plot, &y_positions, style, layout);
    }
    if show_axes {
        let left_ticks: Vec<(f32, LabelFit)> = y_positions.into_iter().zip(y_fits).collect();
        draw_axis(Side::Left, plot, &left_ticks, style, config, layout);
        let bottom_ticks: Vec<(f32, LabelFit)> = x_ticks
            .iter()
            .map(|(position, _)| *position)
            .zip(x_fits)
            .collect();
        draw_axis(Side::Bottom, plot, &bottom_ticks, style, config, layout);
    }

    if let Some(title) = y_title.as_deref() {
        draw_axis_title(Side::Left, plot, title, left_labels + config.axis_title_gap, style, config, layout);
    }
    if let Some(title) = x_title.as_deref() {
        draw_axis_title(Side::Bottom, plot, title, bottom_labels + config.axis_title_gap, style, config, layout);
    }

    Cartesian { plot, x, y }
}
