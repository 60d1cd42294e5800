use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use svg_chart_renderer::chart::render_chart;
use svg_chart_renderer::config::Config;
use svg_chart_renderer::layout::fallback_text_width;
use svg_chart_renderer::parser::parse_envelope;
use svg_chart_renderer::recipe::ChartKind;

fn envelope_source(categories: usize, groups: usize) -> String {
    let mut rows = Vec::with_capacity(categories * groups.max(1));
    for c in 0..categories {
        for g in 0..groups.max(1) {
            rows.push(format!(
                r#"{{"category": "Category {c}", "value": {}, "series": "Series {g}", "size": {}}}"#,
                (c * 37 + g * 11) % 100 + 1,
                (c + g) % 9 + 1
            ));
        }
    }
    format!(
        r#"{{
            "data": {{
                "data": [{}],
                "columns": [
                    {{"name": "category", "role": "x"}},
                    {{"name": "value", "role": "y", "unit": "$"}},
                    {{"name": "series", "role": "group"}},
                    {{"name": "size", "role": "y2"}}
                ]
            }},
            "variables": {{"title": "Benchmark chart", "width": 960, "height": 540}}
        }}"#,
        rows.join(",")
    )
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (categories, groups) in [(10, 1), (100, 4), (200, 12)] {
        let source = envelope_source(categories, groups);
        let name = format!("{categories}x{groups}");
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, data| {
            b.iter(|| {
                let envelope = parse_envelope(black_box(data)).expect("parse failed");
                black_box(envelope.rows().len());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let mut config = Config::default();
    config.layout.fast_text_metrics = true;
    let cases = [
        (ChartKind::Bar, 50, 1),
        (ChartKind::HorizontalBar, 50, 1),
        (ChartKind::GroupedBar, 40, 6),
        (ChartKind::StackedBar, 40, 6),
        (ChartKind::Line, 100, 6),
        (ChartKind::Area, 100, 6),
        (ChartKind::Scatter, 100, 6),
        (ChartKind::Pie, 12, 1),
        (ChartKind::Donut, 12, 1),
    ];
    for (kind, categories, groups) in cases {
        let envelope = parse_envelope(&envelope_source(categories, groups)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(kind), &envelope, |b, envelope| {
            b.iter(|| {
                let chart = render_chart(kind, black_box(envelope), &config).expect("render failed");
                black_box(chart.svg.len());
            });
        });
    }
    group.finish();
}

fn bench_text_fallback(c: &mut Criterion) {
    let label = "Quarterly revenue by region";
    c.bench_function("fallback_text_width", |b| {
        b.iter(|| black_box(fallback_text_width(black_box(label), black_box(12.0))));
    });
}

criterion_group!(benches, bench_parse, bench_render, bench_text_fallback);
criterion_main!(benches);
