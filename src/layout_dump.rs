use crate::layout::{Layout, Primitive, TextMark};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: String,
    pub width: f32,
    pub height: f32,
    pub title: Option<Vec<String>>,
    pub counts: LayerCounts,
    pub axes: Vec<Primitive>,
    pub marks: Vec<Primitive>,
    pub labels: Vec<Primitive>,
    pub legend: Vec<Primitive>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LayerCounts {
    pub axes: usize,
    pub marks: usize,
    pub labels: usize,
    pub legend: usize,
    pub total: usize,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            kind: layout.kind.to_string(),
            width: layout.width,
            height: layout.height,
            title: layout
                .title
                .as_ref()
                .map(|mark: &TextMark| mark.block.lines.clone()),
            counts: LayerCounts {
                axes: layout.axes.len(),
                marks: layout.marks.len(),
                labels: layout.labels.len(),
                legend: layout.legend.len(),
                total: layout.primitive_count(),
            },
            axes: layout.axes.clone(),
            marks: layout.marks.clone(),
            labels: layout.labels.clone(),
            legend: layout.legend.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render_chart;
    use crate::config::Config;
    use crate::parser::parse_envelope;
    use crate::recipe::ChartKind;

    fn layout() -> Layout {
        let envelope = parse_envelope(
            r#"{
                "data": {
                    "data": [{"c": "A", "v": 1}, {"c": "B", "v": 2}],
                    "columns": [{"name": "c", "role": "x"}, {"name": "v", "role": "y"}]
                },
                "variables": {"title": "Totals"}
            }"#,
        )
        .expect("valid envelope");
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        render_chart(ChartKind::Bar, &envelope, &config)
            .expect("renders")
            .layout
    }

    #[test]
    fn counts_match_layers() {
        let layout = layout();
        let dump = LayoutDump::from_layout(&layout);
        assert_eq!(dump.kind, "bar");
        assert_eq!(dump.counts.marks, 2);
        assert_eq!(dump.counts.total, layout.primitive_count());
        assert_eq!(dump.title, Some(vec!["Totals".to_string()]));
    }

    #[test]
    fn writes_pretty_json() {
        let dir = std::env::temp_dir().join(format!("chartr-dump-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("layout.json");
        write_layout_dump(&path, &layout()).expect("dump written");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("readable")).expect("json");
        assert_eq!(json["counts"]["marks"], 2);
        assert_eq!(json["marks"][0]["type"], "rect");
        std::fs::remove_dir_all(&dir).ok();
    }
}
