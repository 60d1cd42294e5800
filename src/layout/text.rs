use crate::config::LayoutConfig;
use crate::recipe::FitStrategy;
use crate::style::FontStyle;
use crate::text_metrics;

use super::TextBlock;

/// Average glyph advance as a fraction of the font size, used when no
/// font face can be measured.
pub const AVERAGE_CHAR_WIDTH_EM: f32 = 0.6;

const ELLIPSIS: char = '…';
const FIT_TOLERANCE: f32 = 0.01;

fn fits(width: f32, max_width: f32) -> bool {
    width <= max_width + FIT_TOLERANCE
}

/// Deterministic width estimate: `0.6 × font_size × char_count`.
pub fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    if font_size <= 0.0 {
        return 0.0;
    }
    AVERAGE_CHAR_WIDTH_EM * font_size * text.chars().count() as f32
}

pub fn text_width(text: &str, font: &FontStyle, config: &LayoutConfig) -> f32 {
    if config.fast_text_metrics {
        return fallback_text_width(text, font.size);
    }
    match text_metrics::measure_text_width(text, font.size, &font.family, font.weight) {
        Some(width) => width,
        None => fallback_text_width(text, font.size),
    }
}

pub fn line_height(font_size: f32, config: &LayoutConfig) -> f32 {
    font_size * config.label_line_height
}

pub fn measure_label(text: &str, font: &FontStyle, config: &LayoutConfig) -> TextBlock {
    block_from_lines(split_lines(text), font, config)
}

pub(super) fn block_from_lines(
    mut lines: Vec<String>,
    font: &FontStyle,
    config: &LayoutConfig,
) -> TextBlock {
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| text_width(line, font, config))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * line_height(font.size, config);
    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    text.replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

pub(super) fn wrap_line(
    line: &str,
    max_width: f32,
    font: &FontStyle,
    config: &LayoutConfig,
) -> Vec<String> {
    if fits(text_width(line, font, config), max_width) {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if !fits(text_width(&candidate, font, config), max_width) {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Longest prefix of `text` that fits with a trailing ellipsis.
pub(super) fn truncate_to_width(
    text: &str,
    max_width: f32,
    font: &FontStyle,
    config: &LayoutConfig,
) -> Option<String> {
    if fits(text_width(text, font, config), max_width) {
        return Some(text.to_string());
    }
    let chars: Vec<char> = text.chars().collect();
    for keep in (1..chars.len()).rev() {
        let mut candidate: String = chars[..keep].iter().collect::<String>().trim_end().to_string();
        candidate.push(ELLIPSIS);
        if fits(text_width(&candidate, font, config), max_width) {
            return Some(candidate);
        }
    }
    None
}

/// Outcome of fitting a label into its slot.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelFit {
    Fitted {
        block: TextBlock,
        font_size: f32,
        rotation: f32,
    },
    Omitted,
}

impl LabelFit {
    /// Vertical space taken below an axis, accounting for rotation.
    pub fn footprint_height(&self) -> f32 {
        match self {
            LabelFit::Fitted {
                block, rotation, ..
            } => rotated_extent(block.width, block.height, *rotation).1,
            LabelFit::Omitted => 0.0,
        }
    }

    /// Horizontal space taken beside an axis, accounting for rotation.
    pub fn footprint_width(&self) -> f32 {
        match self {
            LabelFit::Fitted {
                block, rotation, ..
            } => rotated_extent(block.width, block.height, *rotation).0,
            LabelFit::Omitted => 0.0,
        }
    }
}

/// Bounding box `(width, height)` of a `width × height` box rotated by `degrees`.
pub fn rotated_extent(width: f32, height: f32, degrees: f32) -> (f32, f32) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    (width * cos + height * sin, width * sin + height * cos)
}

/// Fits `text` into `max_width` using `strategies` in order.
///
/// `max_height` bounds the rotated footprint when rotation is tried.
pub fn fit_label(
    text: &str,
    max_width: f32,
    max_height: Option<f32>,
    font: &FontStyle,
    strategies: &[FitStrategy],
    config: &LayoutConfig,
) -> LabelFit {
    let block = measure_label(text, font, config);
    if fits(block.width, max_width) {
        return LabelFit::Fitted {
            block,
            font_size: font.size,
            rotation: 0.0,
        };
    }

    for strategy in strategies {
        let fitted = match strategy {
            FitStrategy::Wrap => try_wrap(text, max_width, font, config),
            FitStrategy::Shrink => try_shrink(&block, max_width, font, config),
            FitStrategy::Rotate => try_rotate(text, max_width, max_height, font, config),
            FitStrategy::Truncate => {
                let lines: Option<Vec<String>> = block
                    .lines
                    .iter()
                    .map(|line| truncate_to_width(line, max_width, font, config))
                    .collect();
                lines.map(|lines| LabelFit::Fitted {
                    block: block_from_lines(lines, font, config),
                    font_size: font.size,
                    rotation: 0.0,
                })
            }
            FitStrategy::Omit => Some(LabelFit::Omitted),
        };
        if let Some(fit) = fitted {
            return fit;
        }
    }
    LabelFit::Omitted
}

fn try_wrap(text: &str, max_width: f32, font: &FontStyle, config: &LayoutConfig) -> Option<LabelFit> {
    let lines: Vec<String> = split_lines(text)
        .iter()
        .flat_map(|line| wrap_line(line, max_width, font, config))
        .collect();
    if lines.is_empty() || lines.len() > config.max_label_lines.max(1) {
        return None;
    }
    let block = block_from_lines(lines, font, config);
    fits(block.width, max_width).then(|| LabelFit::Fitted {
        block,
        font_size: font.size,
        rotation: 0.0,
    })
}

fn try_shrink(
    block: &TextBlock,
    max_width: f32,
    font: &FontStyle,
    config: &LayoutConfig,
) -> Option<LabelFit> {
    if block.width <= 0.0 || max_width <= 0.0 {
        return None;
    }
    let size = ((font.size * max_width / block.width * 10.0) + 1e-3).floor() / 10.0;
    if size < config.min_font_size {
        return None;
    }
    let shrunk = font.with_size(size);
    let block = block_from_lines(block.lines.clone(), &shrunk, config);
    fits(block.width, max_width).then_some(LabelFit::Fitted {
        block,
        font_size: size,
        rotation: 0.0,
    })
}

/// Rotated rendering of `text`, used to keep a row of axis labels
/// consistent once any of them needed rotation.
pub(super) fn force_rotation(
    text: &str,
    max_width: f32,
    max_height: Option<f32>,
    font: &FontStyle,
    config: &LayoutConfig,
) -> Option<LabelFit> {
    try_rotate(text, max_width, max_height, font, config)
}

fn try_rotate(
    text: &str,
    max_width: f32,
    max_height: Option<f32>,
    font: &FontStyle,
    config: &LayoutConfig,
) -> Option<LabelFit> {
    let angle = config.rotated_label_angle;
    let sin = angle.to_radians().sin().abs();
    if sin < f32::EPSILON {
        return None;
    }
    let single = split_lines(text).join(" ");
    let row_height = line_height(font.size, config);
    // Neighbouring rotated labels are spaced by the slot width along the axis.
    if row_height > max_width * sin {
        return None;
    }
    let mut block = block_from_lines(vec![single.clone()], font, config);
    if let Some(max_height) = max_height {
        let (_, height) = rotated_extent(block.width, block.height, angle);
        if height > max_height {
            let allowed = (max_height - row_height * angle.to_radians().cos().abs()) / sin;
            let truncated = truncate_to_width(&single, allowed, font, config)?;
            block = block_from_lines(vec![truncated], font, config);
        }
    }
    Some(LabelFit::Fitted {
        block,
        font_size: font.size,
        rotation: angle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast_config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn font(size: f32) -> FontStyle {
        FontStyle {
            family: "sans-serif".to_string(),
            size,
            weight: 400,
        }
    }

    #[test]
    fn fallback_is_proportional_to_size_and_length() {
        assert!((fallback_text_width("abcde", 10.0) - 30.0).abs() < 1e-4);
        assert!((fallback_text_width("abcdefghij", 20.0) - 120.0).abs() < 1e-4);
        assert_eq!(fallback_text_width("", 12.0), 0.0);
    }

    #[test]
    fn split_lines_handles_br_tags() {
        assert_eq!(split_lines("a<br/>b"), vec!["a", "b"]);
        assert_eq!(split_lines("a<br>b"), vec!["a", "b"]);
        assert_eq!(split_lines("a\\nb"), vec!["a", "b"]);
    }

    #[test]
    fn short_label_fits_unchanged() {
        let fit = fit_label("A", 100.0, None, &font(12.0), &[FitStrategy::Omit], &fast_config());
        match fit {
            LabelFit::Fitted {
                block, rotation, ..
            } => {
                assert_eq!(block.lines, vec!["A"]);
                assert_eq!(rotation, 0.0);
            }
            LabelFit::Omitted => panic!("short label omitted"),
        }
    }

    #[test]
    fn wrap_is_tried_before_shrink() {
        let config = fast_config();
        // 14 chars * 7.2 = 100.8 > 60; each word fits within 60.
        let fit = fit_label(
            "alpha beta gam",
            60.0,
            None,
            &font(12.0),
            &[FitStrategy::Wrap, FitStrategy::Shrink],
            &config,
        );
        match fit {
            LabelFit::Fitted { block, font_size, .. } => {
                assert_eq!(block.lines.len(), 2);
                assert_eq!(font_size, 12.0);
            }
            LabelFit::Omitted => panic!("expected wrap"),
        }
    }

    #[test]
    fn shrink_respects_minimum_font_size() {
        let config = fast_config();
        let fit = fit_label(
            "abcdefghij",
            60.0,
            None,
            &font(12.0),
            &[FitStrategy::Shrink],
            &config,
        );
        match fit {
            LabelFit::Fitted { font_size, block, .. } => {
                assert!((font_size - 10.0).abs() < 1e-4);
                assert!(block.width <= 60.0 + FIT_TOLERANCE);
            }
            LabelFit::Omitted => panic!("expected shrink"),
        }

        let fit = fit_label(
            "abcdefghijklmnopqrstuvwxyz",
            30.0,
            None,
            &font(12.0),
            &[FitStrategy::Shrink, FitStrategy::Omit],
            &config,
        );
        assert_eq!(fit, LabelFit::Omitted);
    }

    #[test]
    fn rotate_when_slot_is_narrow() {
        let config = fast_config();
        let fit = fit_label(
            "September",
            20.0,
            Some(200.0),
            &font(10.0),
            &[FitStrategy::Rotate],
            &config,
        );
        match fit {
            LabelFit::Fitted { rotation, .. } => assert_eq!(rotation, config.rotated_label_angle),
            LabelFit::Omitted => panic!("expected rotation"),
        }
    }

    #[test]
    fn rotated_label_is_truncated_to_max_height() {
        let config = fast_config();
        let fit = fit_label(
            "An extremely long category label that keeps going",
            20.0,
            Some(60.0),
            &font(10.0),
            &[FitStrategy::Rotate],
            &config,
        );
        assert!(fit.footprint_height() <= 60.0 + 1e-3);
        match fit {
            LabelFit::Fitted { block, .. } => assert!(block.lines[0].ends_with('…')),
            LabelFit::Omitted => panic!("expected truncated rotation"),
        }
    }

    #[test]
    fn truncate_adds_ellipsis() {
        let config = fast_config();
        let truncated =
            truncate_to_width("Category Name", 40.0, &font(10.0), &config).expect("truncated");
        assert!(truncated.ends_with('…'));
        assert!(fits(text_width(&truncated, &font(10.0), &config), 40.0));
    }

    #[test]
    fn rotated_extent_of_square_at_45_degrees() {
        let (w, h) = rotated_extent(10.0, 10.0, 45.0);
        assert!((w - 14.142).abs() < 0.01);
        assert!((h - 14.142).abs() < 0.01);
    }

    proptest! {
        #[test]
        fn fallback_non_decreasing_in_length(text in "[a-zA-Z ]{0,40}", extra in "[a-z]{0,10}", size in 1.0f32..72.0) {
            let longer = format!("{text}{extra}");
            prop_assert!(fallback_text_width(&longer, size) >= fallback_text_width(&text, size));
        }

        #[test]
        fn fallback_non_decreasing_in_font_size(text in "[a-zA-Z0-9 ]{0,40}", size in 1.0f32..72.0, delta in 0.0f32..24.0) {
            prop_assert!(fallback_text_width(&text, size + delta) >= fallback_text_width(&text, size));
        }
    }
}
