//! Render entry points: the fallible pipeline and the container-writing
//! wrapper that never propagates errors.

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{ChartError, ChartResult};
use crate::extract::{Extracted, extract_records, extract_roles};
use crate::ir::{Envelope, Role};
use crate::layout::{Layout, LayoutInput, compute_error_layout, compute_layout};
use crate::recipe::{ChartKind, Recipe};
use crate::render::{render_error_html, render_svg};
use crate::style::ResolvedStyle;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContainerContent {
    #[default]
    Empty,
    Chart(String),
    Error(String),
}

/// Caller-owned render target. Every render clears it first.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub selector: String,
    content: ContainerContent,
}

impl Container {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            content: ContainerContent::Empty,
        }
    }

    pub fn content(&self) -> &ContainerContent {
        &self.content
    }

    /// Markup currently held, chart or error block.
    pub fn markup(&self) -> Option<&str> {
        match &self.content {
            ContainerContent::Empty => None,
            ContainerContent::Chart(markup) | ContainerContent::Error(markup) => Some(markup),
        }
    }

    pub fn clear(&mut self) {
        self.content = ContainerContent::Empty;
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub layout: Layout,
    pub svg: String,
}

impl Chart {
    pub fn width(&self) -> f32 {
        self.layout.width
    }

    pub fn height(&self) -> f32 {
        self.layout.height
    }
}

/// Chart kind from an explicit choice, then the envelope's `chart_type`,
/// then a plain bar chart.
pub fn resolve_kind(explicit: Option<ChartKind>, envelope: &Envelope) -> ChartResult<ChartKind> {
    if let Some(kind) = explicit {
        return Ok(kind);
    }
    match envelope.chart_type.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.parse(),
        _ => Ok(ChartKind::Bar),
    }
}

fn uses_band_axis(kind: ChartKind) -> bool {
    matches!(
        kind,
        ChartKind::Bar
            | ChartKind::HorizontalBar
            | ChartKind::GroupedBar
            | ChartKind::StackedBar
            | ChartKind::Pie
            | ChartKind::Donut
    )
}

fn validate_counts(recipe: &Recipe, data: &Extracted) -> ChartResult<()> {
    if let Some(range) = &recipe.category_range {
        let count = data.categories.len();
        if !range.contains(&count) {
            return Err(ChartError::UnsupportedCount {
                what: "category",
                count,
                min: *range.start(),
                max: *range.end(),
            });
        }
    }
    if let Some(range) = &recipe.group_range
        && data.roles.has(&Role::Group)
    {
        let count = data.groups.len();
        if count == 0 && !recipe.required_roles.contains(&Role::Group) {
            warn!(
                kind = %recipe.kind,
                "group column has no values; drawing a single series"
            );
            return Ok(());
        }
        if !range.contains(&count) {
            return Err(ChartError::UnsupportedCount {
                what: "group",
                count,
                min: *range.start(),
                max: *range.end(),
            });
        }
    }
    Ok(())
}

/// Extract, validate, style, lay out and serialize one chart.
pub fn render_chart(kind: ChartKind, envelope: &Envelope, config: &Config) -> ChartResult<Chart> {
    let recipe = kind.recipe();
    let mut roles = extract_roles(envelope.columns(), recipe.required_roles)?;
    roles.restrict(recipe.required_roles, recipe.optional_roles);
    let require_group = recipe.required_roles.contains(&Role::Group);
    let data = extract_records(envelope.rows(), roles, uses_band_axis(kind), require_group)?;
    validate_counts(&recipe, &data)?;

    let mut style = ResolvedStyle::resolve(envelope, &config.theme);
    if envelope.colors.background_color.is_none() {
        style.background = config.render.background.clone();
    }
    let width = envelope.variables.width().unwrap_or(config.render.width);
    let height = envelope.variables.height().unwrap_or(config.render.height);
    debug!(
        %kind,
        width,
        height,
        records = data.records.len(),
        skipped = data.skipped,
        "rendering chart"
    );

    let input = LayoutInput {
        recipe: &recipe,
        data: &data,
        variables: &envelope.variables,
        style: &style,
        width,
        height,
    };
    let layout = compute_layout(&input, &config.layout);
    let svg = render_svg(&layout);
    Ok(Chart { layout, svg })
}

/// Clears `container` and renders into it. Failures are logged and shown
/// as an inline error block; they are never returned.
pub fn make_chart(
    container: &mut Container,
    kind: ChartKind,
    envelope: &Envelope,
    config: &Config,
) -> Option<Chart> {
    container.clear();
    match render_chart(kind, envelope, config) {
        Ok(chart) => {
            container.content = ContainerContent::Chart(chart.svg.clone());
            Some(chart)
        }
        Err(err) => {
            show_error(container, &err, config);
            None
        }
    }
}

/// Writes the inline error block for `err` into `container`.
pub fn show_error(container: &mut Container, err: &ChartError, config: &Config) {
    error!(
        selector = %container.selector,
        severity = ?err.severity(),
        "chart render failed: {err}"
    );
    let block = compute_error_layout(err, &config.theme);
    container.content = ContainerContent::Error(render_error_html(&block));
}
