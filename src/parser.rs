use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ChartError, ChartResult};
use crate::ir::Envelope;

static CSS_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?|-?\.\d+)\s*(px|pt|em|rem)?\s*$").expect("length regex")
});
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([$€£¥])?\s*(-?[\d,]*\.?\d+(?:[eE][-+]?\d+)?)\s*(%)?\s*$")
        .expect("numeric regex")
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("year regex"));

const BASE_FONT_SIZE_PX: f32 = 16.0;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses a chart envelope, accepting strict JSON first and relaxed JSON5 after.
pub fn parse_envelope(input: &str) -> ChartResult<Envelope> {
    match serde_json::from_str::<Envelope>(input) {
        Ok(envelope) => Ok(envelope),
        Err(strict_err) => match json5::from_str::<Envelope>(input) {
            Ok(envelope) => {
                tracing::debug!("envelope parsed as JSON5");
                Ok(envelope)
            }
            Err(_) => Err(ChartError::InvalidEnvelope(strict_err.to_string())),
        },
    }
}

/// Parses `14`, `14px`, `10.5pt` or `1.2em` into pixels.
pub fn parse_css_length(raw: &str) -> Option<f32> {
    let caps = CSS_LENGTH_RE.captures(raw)?;
    let value: f32 = caps.get(1)?.as_str().parse().ok()?;
    let px = match caps.get(2).map(|m| m.as_str()) {
        Some("pt") => value * 4.0 / 3.0,
        Some("em") | Some("rem") => value * BASE_FONT_SIZE_PX,
        _ => value,
    };
    px.is_finite().then_some(px)
}

/// Normalizes CSS font weights to the numeric 100..=900 scale.
pub fn parse_font_weight(raw: &str) -> Option<u16> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "normal" | "regular" => Some(400),
        "bold" => Some(700),
        "lighter" | "light" => Some(300),
        "bolder" => Some(800),
        "medium" => Some(500),
        "semibold" | "semi-bold" => Some(600),
        other => other
            .parse::<f32>()
            .ok()
            .map(|w| (w.round().clamp(100.0, 900.0)) as u16),
    }
}

/// Reads numbers written with thousands separators, currency or percent signs.
pub fn parse_number(raw: &str) -> Option<f64> {
    let caps = NUMERIC_RE.captures(raw)?;
    let digits = caps.get(2)?.as_str().replace(',', "");
    let value: f64 = digits.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses date-like strings: ISO dates, RFC 3339 timestamps, common
/// day/month orders, `YYYY-MM` and bare four-digit years.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if YEAR_RE.is_match(raw) {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_lengths() {
        assert_eq!(parse_css_length("14px"), Some(14.0));
        assert_eq!(parse_css_length(" 12 "), Some(12.0));
        assert_eq!(parse_css_length("1.5em"), Some(24.0));
        assert_eq!(parse_css_length("12pt"), Some(16.0));
        assert_eq!(parse_css_length("large"), None);
    }

    #[test]
    fn font_weights() {
        assert_eq!(parse_font_weight("bold"), Some(700));
        assert_eq!(parse_font_weight("600"), Some(600));
        assert_eq!(parse_font_weight("1200"), Some(900));
        assert_eq!(parse_font_weight("heavy-ish"), None);
    }

    #[test]
    fn numbers_with_decoration() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("$20"), Some(20.0));
        assert_eq!(parse_number("45%"), Some(45.0));
        assert_eq!(parse_number("-3e2"), Some(-300.0));
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn dates_in_common_shapes() {
        let day = parse_date("2024-03-05").expect("iso date");
        assert_eq!(day.format("%Y-%m-%d").to_string(), "2024-03-05");
        assert!(parse_date("2024-03").is_some());
        assert!(parse_date("2021").is_some());
        assert!(parse_date("2024-03-05T10:00:00Z").is_some());
        assert!(parse_date("Apples").is_none());
        assert!(parse_date("12345").is_none());
    }

    #[test]
    fn envelope_accepts_json5() {
        let input = r#"{
            // relaxed syntax
            data: { data: [{cat: "A", val: 1},], columns: [{name: "cat", role: "x"}] },
        }"#;
        let envelope = parse_envelope(input).expect("json5 envelope");
        assert_eq!(envelope.rows().len(), 1);
        assert_eq!(envelope.columns()[0].name, "cat");
    }

    #[test]
    fn envelope_rejects_garbage() {
        let err = parse_envelope("not json").expect_err("garbage must fail");
        assert!(matches!(err, ChartError::InvalidEnvelope(_)));
    }
}
