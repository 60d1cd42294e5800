use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::{Envelope, FontSpec, NumberOrString};
use crate::parser::parse_font_weight;
use crate::theme::{FontDefaults, Theme};

/// A concrete font after overrides are applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontStyle {
    pub family: String,
    pub size: f32,
    pub weight: u16,
}

impl FontStyle {
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

/// Render-local style record; always fully populated.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub title: FontStyle,
    pub label: FontStyle,
    pub annotation: FontStyle,
    pub text_color: String,
    pub background: String,
    pub axis_color: String,
    pub grid_color: String,
    pub slice_stroke: String,
    palette: Vec<String>,
    field_colors: BTreeMap<String, String>,
    primary: Option<String>,
    icons: BTreeMap<String, String>,
}

impl ResolvedStyle {
    pub fn resolve(envelope: &Envelope, theme: &Theme) -> Self {
        let colors = &envelope.colors;
        let typography = &envelope.typography;
        let other = |key: &str| colors.other.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let palette = if colors.available_colors.is_empty() {
            theme.palette.clone()
        } else {
            colors.available_colors.clone()
        };
        let palette = if palette.is_empty() {
            Theme::classic().palette
        } else {
            palette
        };

        Self {
            title: resolve_font(typography.title.as_ref(), &theme.title),
            label: resolve_font(typography.label.as_ref(), &theme.label),
            annotation: resolve_font(typography.annotation.as_ref(), &theme.annotation),
            text_color: first_defined(colors.text_color.as_ref(), &theme.text_color),
            background: first_defined(colors.background_color.as_ref(), &theme.background),
            axis_color: other("axis").unwrap_or_else(|| theme.axis_color.clone()),
            grid_color: other("grid").unwrap_or_else(|| theme.grid_color.clone()),
            slice_stroke: other("stroke").unwrap_or_else(|| theme.slice_stroke.clone()),
            palette,
            field_colors: colors.field.clone(),
            primary: other("primary"),
            icons: envelope.images.field.clone(),
        }
    }

    /// Color of a category: explicit field override, then the caller's
    /// available colors, then the theme palette, cycling by index.
    pub fn color_for(&self, category: &str, index: usize) -> String {
        if let Some(color) = self.field_color(category) {
            return color.to_string();
        }
        self.palette[index % self.palette.len()].clone()
    }

    /// Explicit per-category override, if the caller supplied one.
    pub fn field_color(&self, category: &str) -> Option<&str> {
        self.field_colors
            .get(category)
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    /// Color for charts drawing a single series.
    pub fn series_color(&self) -> String {
        self.primary
            .clone()
            .unwrap_or_else(|| self.palette[0].clone())
    }

    pub fn icon_for(&self, category: &str) -> Option<&str> {
        self.icons
            .get(category)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

fn first_defined(value: Option<&String>, fallback: &str) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn resolve_font(spec: Option<&FontSpec>, defaults: &FontDefaults) -> FontStyle {
    let Some(spec) = spec else {
        return FontStyle {
            family: defaults.font_family.clone(),
            size: defaults.font_size,
            weight: defaults.font_weight,
        };
    };
    let size = spec
        .font_size
        .as_ref()
        .and_then(NumberOrString::as_f32)
        .filter(|size| *size > 0.0)
        .unwrap_or(defaults.font_size);
    let weight = spec
        .font_weight
        .as_ref()
        .and_then(|w| parse_font_weight(&w.as_string()))
        .unwrap_or(defaults.font_weight);
    FontStyle {
        family: first_defined(spec.font_family.as_ref(), &defaults.font_family),
        size,
        weight,
    }
}
