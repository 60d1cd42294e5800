use std::f32::consts::TAU;

use crate::config::LayoutConfig;
use crate::extract::XValue;
use crate::recipe::ChartKind;

use super::scale::{AngularScale, format_value};
use super::text::{LabelFit, fit_label};
use super::{Anchor, Frame, Layout, LayoutInput, Primitive, contrast_text, text_mark};

const FULL_TURN_EPSILON: f32 = 1e-4;

/// Point at `angle` radians clockwise from twelve o'clock.
fn polar(cx: f32, cy: f32, radius: f32, angle: f32) -> (f32, f32) {
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

fn circle_path(cx: f32, cy: f32, r: f32, sweep: u8) -> String {
    format!(
        "M{cx:.2},{top:.2} A{r:.2},{r:.2} 0 1 {sweep} {cx:.2},{bottom:.2} A{r:.2},{r:.2} 0 1 {sweep} {cx:.2},{top:.2} Z",
        top = cy - r,
        bottom = cy + r,
    )
}

/// SVG path for an annular sector; `inner == 0` yields a pie wedge.
pub(super) fn arc_path(cx: f32, cy: f32, outer: f32, inner: f32, start: f32, end: f32) -> String {
    let span = end - start;
    if span >= TAU - FULL_TURN_EPSILON {
        let mut d = circle_path(cx, cy, outer, 1);
        if inner > 0.0 {
            d.push(' ');
            d.push_str(&circle_path(cx, cy, inner, 0));
        }
        return d;
    }
    let large = u8::from(span > std::f32::consts::PI);
    let (x0, y0) = polar(cx, cy, outer, start);
    let (x1, y1) = polar(cx, cy, outer, end);
    if inner <= 0.0 {
        return format!(
            "M{cx:.2},{cy:.2} L{x0:.2},{y0:.2} A{outer:.2},{outer:.2} 0 {large} 1 {x1:.2},{y1:.2} Z"
        );
    }
    let (ix1, iy1) = polar(cx, cy, inner, end);
    let (ix0, iy0) = polar(cx, cy, inner, start);
    format!(
        "M{x0:.2},{y0:.2} A{outer:.2},{outer:.2} 0 {large} 1 {x1:.2},{y1:.2} \
         L{ix1:.2},{iy1:.2} A{inner:.2},{inner:.2} 0 {large} 0 {ix0:.2},{iy0:.2} Z"
    )
}

fn percent_label(percent: f64) -> String {
    format_value((percent * 10.0).round() / 10.0, Some("%"))
}

pub(super) fn layout_pie(
    input: &LayoutInput<'_>,
    area: Frame,
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    let data = input.data;
    let style = input.style;
    let donut = input.recipe.kind == ChartKind::Donut;
    let cx = area.x + area.width / 2.0;
    let cy = area.y + area.height / 2.0;
    let outer = (area.width.min(area.height) / 2.0 - 4.0).max(1.0);
    let inner = if donut {
        outer * config.donut_inner_ratio.clamp(0.0, 0.95)
    } else {
        0.0
    };

    // Rows sharing a category add up to one slice.
    let values: Vec<f64> = data
        .categories
        .iter()
        .map(|name| {
            data.records
                .iter()
                .filter(|r| matches!(&r.x, XValue::Category(c) if c == name))
                .map(|r| r.y)
                .sum()
        })
        .collect();
    let angles = AngularScale::new(&values);
    let unit = data.y_unit();
    let labels = input.data_labels();

    let slices = data.categories.iter().zip(&values).zip(angles.arcs());
    for (index, ((name, &value), &(start, end))) in slices.enumerate() {
        let fill = style.color_for(name, index);
        let percent = angles.percent(value);
        layout.marks.push(Primitive::Path {
            d: arc_path(cx, cy, outer, inner, start, end),
            fill: Some(fill.clone()),
            stroke: Some(style.slice_stroke.clone()),
            stroke_width: 1.0,
            opacity: 1.0,
            tooltip: Some(format!(
                "{}: {} ({})",
                name,
                format_value(value, unit),
                percent_label(percent)
            )),
        });

        if !labels || percent < config.pie_label_min_percent as f64 {
            continue;
        }
        let span = end - start;
        let mid_radius = if donut {
            (outer + inner) / 2.0
        } else {
            outer * 0.65
        };
        let chord = if span >= std::f32::consts::PI {
            2.0 * mid_radius
        } else {
            2.0 * mid_radius * (span / 2.0).sin()
        };
        let thickness = if donut { outer - inner } else { outer };
        let LabelFit::Fitted {
            block, font_size, ..
        } = fit_label(
            &percent_label(percent),
            chord.min(thickness),
            None,
            &style.annotation,
            input.recipe.data_label_fit,
            config,
        )
        else {
            continue;
        };
        let (x, y) = if span >= TAU - FULL_TURN_EPSILON && !donut {
            (cx, cy)
        } else {
            polar(cx, cy, mid_radius, start + span / 2.0)
        };
        let font = style.annotation.with_size(font_size);
        layout.labels.push(Primitive::Text(text_mark(
            x,
            y,
            block,
            &font,
            &contrast_text(&fill, &style.text_color),
            Anchor::Middle,
            0.0,
            config,
        )));
    }

    if donut && inner > 0.0 {
        let total = format_value(angles.total(), unit);
        if let LabelFit::Fitted {
            block, font_size, ..
        } = fit_label(
            &total,
            inner * 1.6,
            None,
            &style.title,
            input.recipe.data_label_fit,
            config,
        ) {
            let font = style.title.with_size(font_size);
            layout.labels.push(Primitive::Text(text_mark(
                cx,
                cy,
                block,
                &font,
                &style.text_color,
                Anchor::Middle,
                0.0,
                config,
            )));
        }
    }
}
