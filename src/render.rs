use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::error::Severity;
use crate::layout::{ErrorLayout, Layout, Primitive, TextMark};

/// Baseline offset of a text row below its vertical middle, in ems.
const BASELINE_SHIFT_EM: f32 = 0.35;

pub fn render_svg(layout: &Layout) -> String {
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" class="chart chart-{kind}" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#,
        kind = layout.kind,
    );
    let _ = write!(
        svg,
        r#"<rect class="background" x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
        escape_xml(&layout.background)
    );

    for (class, layer) in [
        ("axes", &layout.axes),
        ("marks", &layout.marks),
        ("labels", &layout.labels),
        ("legend", &layout.legend),
    ] {
        let _ = write!(svg, r#"<g class="{class}">"#);
        for primitive in layer {
            primitive_svg(&mut svg, primitive);
        }
        svg.push_str("</g>");
    }

    if let Some(title) = &layout.title {
        svg.push_str(r#"<g class="title">"#);
        text_svg(&mut svg, title);
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn close_with_tooltip(out: &mut String, tag: &str, tooltip: Option<&str>) {
    match tooltip {
        Some(text) => {
            let _ = write!(out, "><title>{}</title></{tag}>", escape_xml(text));
        }
        None => out.push_str("/>"),
    }
}

fn primitive_svg(out: &mut String, primitive: &Primitive) {
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            rx,
            tooltip,
        } => {
            let _ = write!(
                out,
                r#"<rect x="{x:.2}" y="{y:.2}" width="{:.2}" height="{:.2}" fill="{}""#,
                width.max(0.0),
                height.max(0.0),
                escape_xml(fill)
            );
            if let Some(stroke) = stroke {
                let _ = write!(out, r#" stroke="{}""#, escape_xml(stroke));
            }
            if *rx > 0.0 {
                let _ = write!(out, r#" rx="{rx:.2}""#);
            }
            close_with_tooltip(out, "rect", tooltip.as_deref());
        }
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
            dash,
        } => {
            let _ = write!(
                out,
                r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-width="{stroke_width}""#,
                escape_xml(stroke)
            );
            if let Some(dash) = dash {
                let _ = write!(out, r#" stroke-dasharray="{}""#, escape_xml(dash));
            }
            out.push_str("/>");
        }
        Primitive::Path {
            d,
            fill,
            stroke,
            stroke_width,
            opacity,
            tooltip,
        } => {
            let fill = fill.as_deref().map(escape_xml).unwrap_or_else(|| "none".to_string());
            let _ = write!(out, r#"<path d="{d}" fill="{fill}""#);
            if let Some(stroke) = stroke {
                let _ = write!(
                    out,
                    r#" stroke="{}" stroke-width="{stroke_width}" stroke-linejoin="round""#,
                    escape_xml(stroke)
                );
            }
            if *opacity < 1.0 {
                let _ = write!(out, r#" fill-opacity="{opacity}""#);
            }
            close_with_tooltip(out, "path", tooltip.as_deref());
        }
        Primitive::Circle {
            cx,
            cy,
            r,
            fill,
            stroke,
            tooltip,
        } => {
            let _ = write!(
                out,
                r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{}""#,
                escape_xml(fill)
            );
            if let Some(stroke) = stroke {
                let _ = write!(out, r#" stroke="{}""#, escape_xml(stroke));
            }
            close_with_tooltip(out, "circle", tooltip.as_deref());
        }
        Primitive::Text(mark) => text_svg(out, mark),
        Primitive::Image {
            x,
            y,
            width,
            height,
            href,
        } => {
            let href = escape_xml(href);
            let _ = write!(
                out,
                r#"<image x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" href="{href}" xlink:href="{href}" preserveAspectRatio="xMidYMid meet"/>"#
            );
        }
    }
}

fn text_svg(out: &mut String, mark: &TextMark) {
    let lines = &mark.block.lines;
    let first = mark.y - mark.block.height / 2.0
        + mark.line_height / 2.0
        + mark.font.size * BASELINE_SHIFT_EM;
    let _ = write!(
        out,
        r#"<text x="{:.2}" y="{first:.2}" text-anchor="{}" font-family="{}" font-size="{}" font-weight="{}" fill="{}""#,
        mark.x,
        mark.anchor.as_svg(),
        escape_xml(&mark.font.family),
        mark.font.size,
        mark.font.weight,
        escape_xml(&mark.fill),
    );
    if mark.rotation != 0.0 {
        let _ = write!(
            out,
            r#" transform="rotate({} {:.2} {:.2})""#,
            mark.rotation, mark.x, mark.y
        );
    }
    out.push('>');
    if lines.len() == 1 {
        out.push_str(&escape_xml(&lines[0]));
    } else {
        for (idx, line) in lines.iter().enumerate() {
            let _ = write!(
                out,
                r#"<tspan x="{:.2}" y="{:.2}">{}</tspan>"#,
                mark.x,
                first + idx as f32 * mark.line_height,
                escape_xml(line)
            );
        }
    }
    out.push_str("</text>");
}

/// Inline HTML block shown in place of a chart that could not render.
pub fn render_error_html(error: &ErrorLayout) -> String {
    let severity = match error.severity {
        Severity::Configuration => "configuration",
        Severity::Data => "data",
    };
    let color = escape_html(&error.color);
    format!(
        r#"<div class="chart-error chart-error--{severity}" role="alert" style="color: {color}; border: 1px solid {color}; border-radius: 4px; padding: 12px 16px; font-family: {}; font-size: {}px;">{}</div>"#,
        escape_html(&error.font_family),
        error.font_size,
        escape_html(&error.message)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Anchor, TextBlock};
    use crate::recipe::ChartKind;
    use crate::style::FontStyle;

    fn empty_layout() -> Layout {
        Layout {
            kind: ChartKind::Bar,
            width: 320.0,
            height: 200.0,
            background: "#FFFFFF".to_string(),
            title: None,
            axes: Vec::new(),
            marks: Vec::new(),
            labels: Vec::new(),
            legend: Vec::new(),
        }
    }

    fn mark(lines: &[&str], rotation: f32) -> TextMark {
        TextMark {
            x: 10.0,
            y: 20.0,
            block: TextBlock {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                width: 40.0,
                height: 14.4 * lines.len() as f32,
            },
            font: FontStyle {
                family: "\"Helvetica Neue\", sans-serif".to_string(),
                size: 12.0,
                weight: 400,
            },
            fill: "#333".to_string(),
            anchor: Anchor::Middle,
            rotation,
            line_height: 14.4,
        }
    }

    #[test]
    fn root_carries_requested_size_and_layers() {
        let svg = render_svg(&empty_layout());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="320""#));
        assert!(svg.contains(r#"height="200""#));
        for class in ["axes", "marks", "labels", "legend"] {
            assert!(svg.contains(&format!(r#"<g class="{class}">"#)));
        }
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn text_is_escaped_and_split_into_tspans() {
        let mut layout = empty_layout();
        layout.labels.push(Primitive::Text(mark(&["R&D <2024>", "second"], 0.0)));
        let svg = render_svg(&layout);
        assert!(svg.contains("R&amp;D &lt;2024&gt;"));
        assert_eq!(svg.matches("<tspan").count(), 2);
        assert!(svg.contains("&quot;Helvetica Neue&quot;"));
    }

    #[test]
    fn rotated_text_gets_transform() {
        let mut layout = empty_layout();
        layout.axes.push(Primitive::Text(mark(&["label"], -45.0)));
        let svg = render_svg(&layout);
        assert!(svg.contains(r#"transform="rotate(-45 10.00 20.00)""#));
    }

    #[test]
    fn tooltips_become_title_children() {
        let mut layout = empty_layout();
        layout.marks.push(Primitive::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            fill: "red".to_string(),
            stroke: None,
            rx: 0.0,
            tooltip: Some("A: 10".to_string()),
        });
        let svg = render_svg(&layout);
        assert!(svg.contains("<title>A: 10</title></rect>"));
    }

    #[test]
    fn error_block_is_escaped_html() {
        let html = render_error_html(&ErrorLayout {
            severity: Severity::Data,
            message: "no <data>".to_string(),
            color: "#ED6C02".to_string(),
            font_family: "Arial".to_string(),
            font_size: 12.0,
        });
        assert!(html.starts_with(r#"<div class="chart-error chart-error--data" role="alert""#));
        assert!(html.contains("color: #ED6C02"));
        assert!(html.contains("no &lt;data&gt;"));
    }
}
