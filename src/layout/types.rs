use serde::Serialize;

use crate::error::Severity;
use crate::recipe::ChartKind;
use crate::style::FontStyle;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// A positioned text element. `(x, y)` is the anchor point of the
/// vertical middle of the block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMark {
    pub x: f32,
    pub y: f32,
    pub block: TextBlock,
    pub font: FontStyle,
    pub fill: String,
    pub anchor: Anchor,
    pub rotation: f32,
    pub line_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: String,
        stroke: Option<String>,
        rx: f32,
        tooltip: Option<String>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: String,
        stroke_width: f32,
        dash: Option<String>,
    },
    Path {
        d: String,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: f32,
        opacity: f32,
        tooltip: Option<String>,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: String,
        stroke: Option<String>,
        tooltip: Option<String>,
    },
    Text(TextMark),
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        href: String,
    },
}

impl Primitive {
    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Primitive::Rect { tooltip, .. }
            | Primitive::Path { tooltip, .. }
            | Primitive::Circle { tooltip, .. } => tooltip.as_deref(),
            _ => None,
        }
    }
}

/// Result of the drawing pass, grouped by layer in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub kind: ChartKind,
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub title: Option<TextMark>,
    pub axes: Vec<Primitive>,
    pub marks: Vec<Primitive>,
    pub labels: Vec<Primitive>,
    pub legend: Vec<Primitive>,
}

impl Layout {
    pub fn primitive_count(&self) -> usize {
        self.axes.len()
            + self.marks.len()
            + self.labels.len()
            + self.legend.len()
            + usize::from(self.title.is_some())
    }
}

/// Inline fallback content shown when a render is aborted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLayout {
    pub severity: Severity,
    pub message: String,
    pub color: String,
    pub font_family: String,
    pub font_size: f32,
}

/// Inner plot area in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
