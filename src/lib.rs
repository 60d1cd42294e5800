pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod recipe;
pub mod render;
pub mod style;
pub mod text_metrics;
pub mod theme;

pub use chart::{Chart, Container, ContainerContent, make_chart, render_chart, resolve_kind};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{ChartError, ChartResult, Severity};
pub use ir::Envelope;
pub use parser::parse_envelope;
pub use recipe::ChartKind;
