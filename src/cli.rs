use crate::chart::{render_chart, resolve_kind};
use crate::config::load_config;
use crate::ir::NumberOrString;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_envelope;
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::write_output_svg;
use crate::recipe::ChartKind;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "chartr", version, about = "Render JSON chart envelopes to SVG")]
pub struct Args {
    /// Input envelope (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Chart type; falls back to the envelope's chart_type, then bar
    #[arg(short = 'k', long = "kind", value_parser = parse_kind)]
    pub kind: Option<ChartKind>,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width, overriding the envelope
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height, overriding the envelope
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Write a JSON dump of the computed layout
    #[arg(long = "dumpLayout", alias = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

fn parse_kind(raw: &str) -> Result<ChartKind, String> {
    raw.parse().map_err(|err: crate::error::ChartError| err.to_string())
}

/// Logs go to stderr so SVG on stdout stays clean. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let mut envelope = parse_envelope(&input)?;
    if let Some(width) = args.width {
        envelope.variables.width = Some(NumberOrString::Number(width));
        config.render.width = width;
    }
    if let Some(height) = args.height {
        envelope.variables.height = Some(NumberOrString::Number(height));
        config.render.height = height;
    }

    let kind = resolve_kind(args.kind, &envelope)?;
    let chart = render_chart(kind, &envelope, &config)?;
    tracing::debug!(%kind, width = chart.width(), height = chart.height(), "chart rendered");

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &chart.layout)?;
    }

    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&chart.svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&chart.svg, &output, &config)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &crate::config::Config) -> Result<()> {
    let mut render = config.render.clone();
    if let Some((width, height)) = svg_size(svg) {
        render.width = width;
        render.height = height;
    }
    write_output_png(svg, output, &render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &crate::config::Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires building with the `png` feature"
    ))
}

#[cfg(feature = "png")]
fn svg_size(svg: &str) -> Option<(f32, f32)> {
    let attr = |name: &str| -> Option<f32> {
        let start = svg.find(&format!("{name}=\""))? + name.len() + 2;
        let end = svg[start..].find('"')? + start;
        svg[start..end].parse().ok()
    };
    Some((attr("width")?, attr("height")?))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
