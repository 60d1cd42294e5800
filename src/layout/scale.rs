//! Positional mappings from data domains to pixel ranges.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
/// Largest magnitude a domain bound may take; `hi - lo` stays finite.
const MAX_DOMAIN: f64 = f64::MAX / 4.0;
/// Upper bound on ticks per requested tick.
const TICKS_PER_COUNT: usize = 10;

/// Substitutes a minimal non-zero domain for empty, degenerate or
/// non-finite input so coordinate math never divides by zero.
fn sanitize_domain(start: f64, end: f64) -> (f64, f64) {
    if !start.is_finite() || !end.is_finite() {
        return (0.0, 1.0);
    }
    let start = start.clamp(-MAX_DOMAIN, MAX_DOMAIN);
    let end = end.clamp(-MAX_DOMAIN, MAX_DOMAIN);
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    if (hi - lo).abs() > f64::EPSILON * lo.abs().max(1.0) {
        return (lo, hi);
    }
    if lo == 0.0 { (0.0, 1.0) } else { (lo - 0.5, lo + 0.5) }
}

/// d3-style tick increment: 1, 2 or 5 times a power of ten.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start).abs() / count.max(1) as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

/// Tick indices `i` with `lo <= i * step <= hi`, or `None` when the
/// domain would produce an unbounded tick run.
fn tick_indices(lo: f64, hi: f64, step: f64, count: usize) -> Option<std::ops::RangeInclusive<i64>> {
    let first = (lo / step).ceil();
    let last = (hi / step).floor();
    let limit = (count.max(1) * TICKS_PER_COUNT) as f64;
    if !first.is_finite() || !last.is_finite() || last - first > limit {
        return None;
    }
    Some(first as i64..=last as i64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self {
            domain: sanitize_domain(domain.0, domain.1),
            range,
        }
    }

    /// Domain spanning the finite `values`; optionally anchored at zero.
    pub fn from_values(
        values: impl IntoIterator<Item = f64>,
        include_zero: bool,
        range: (f32, f32),
    ) -> Self {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if include_zero && lo.is_finite() {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        Self::new((lo, hi), range)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn with_range(self, range: (f32, f32)) -> Self {
        Self { range, ..self }
    }

    pub fn map(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = (value - d0) / (d1 - d0);
        r0 + t as f32 * (r1 - r0)
    }

    /// Extends the domain outward to whole tick steps.
    pub fn nice(self, count: usize) -> Self {
        let (mut lo, mut hi) = self.domain;
        for _ in 0..2 {
            let step = tick_step(lo, hi, count);
            let (nice_lo, nice_hi) = ((lo / step).floor() * step, (hi / step).ceil() * step);
            if !nice_lo.is_finite() || !nice_hi.is_finite() {
                break;
            }
            (lo, hi) = (nice_lo, nice_hi);
        }
        Self::new((lo, hi), self.range)
    }

    /// Spacing between the values returned by [`LinearScale::ticks`].
    pub fn tick_step(&self, count: usize) -> f64 {
        tick_step(self.domain.0, self.domain.1, count)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.domain;
        let step = tick_step(lo, hi, count);
        let Some(indices) = tick_indices(lo, hi, step, count) else {
            return Vec::new();
        };
        indices
            .map(|i| {
                let value = i as f64 * step;
                // Snap float noise such as 0.30000000000000004.
                let snapped = (value / step).round() * step;
                if snapped.abs() < step * 1e-9 { 0.0 } else { snapped }
            })
            .collect()
    }
}

/// Ordinal scale dividing a range into equal slots with padding.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    categories: Vec<String>,
    start: f32,
    step: f32,
    bandwidth: f32,
}

impl BandScale {
    pub fn new(categories: Vec<String>, range: (f32, f32), padding_inner: f32, padding_outer: f32) -> Self {
        let inner = padding_inner.clamp(0.0, 0.99);
        let outer = padding_outer.max(0.0);
        let n = categories.len() as f32;
        let (r0, r1) = range;
        let span = r1 - r0;
        let step = span / (n - inner + outer * 2.0).max(1.0);
        let start = r0 + (span - step * (n - inner)) / 2.0;
        Self {
            categories,
            start,
            step,
            bandwidth: step * (1.0 - inner),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }

    /// Start coordinate of slot `index`.
    pub fn slot(&self, index: usize) -> f32 {
        self.start + index as f32 * self.step
    }

    pub fn position(&self, category: &str) -> Option<f32> {
        self.index_of(category).map(|idx| self.slot(idx))
    }

    pub fn center(&self, category: &str) -> Option<f32> {
        self.position(category).map(|start| start + self.bandwidth / 2.0)
    }
}

/// Linear scale over timestamps (seconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, range: (f32, f32)) -> Self {
        let (mut lo, mut hi) = (seconds(start), seconds(end));
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        if hi - lo < 1.0 {
            lo -= SECONDS_PER_DAY;
            hi += SECONDS_PER_DAY;
        }
        Self {
            inner: LinearScale::new((lo, hi), range),
        }
    }

    pub fn from_seconds(values: impl IntoIterator<Item = f64>, range: (f32, f32)) -> Self {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if !lo.is_finite() {
            lo = 0.0;
            hi = 0.0;
        }
        match (from_seconds(lo), from_seconds(hi)) {
            (Some(start), Some(end)) => Self::new(start, end, range),
            _ => Self {
                inner: LinearScale::new((lo, hi), range),
            },
        }
    }

    pub fn map_seconds(&self, value: f64) -> f32 {
        self.inner.map(value)
    }

    pub fn map(&self, value: NaiveDateTime) -> f32 {
        self.inner.map(seconds(value))
    }

    /// Calendar-aligned ticks with labels formatted for the domain span.
    pub fn ticks(&self, count: usize) -> Vec<(f64, String)> {
        let (lo, hi) = self.inner.domain();
        let (Some(start), Some(end)) = (from_seconds(lo), from_seconds(hi)) else {
            return Vec::new();
        };
        let span_days = (hi - lo) / SECONDS_PER_DAY;

        if span_days >= 2.0 * 365.0 {
            let y0 = start.year();
            let y1 = end.year();
            let step = tick_step(y0 as f64, y1 as f64, count).max(1.0) as i32;
            let ticks: Vec<(f64, String)> = (y0..=y1)
                .filter(|y| y.rem_euclid(step) == 0)
                .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1)?.and_hms_opt(0, 0, 0))
                .map(seconds)
                .filter(|s| *s >= lo && *s <= hi)
                .map(|s| (s, format_seconds(s, "%Y")))
                .collect();
            if ticks.len() >= 2 {
                return ticks;
            }
        }

        if span_days >= 60.0 {
            let m0 = start.year() * 12 + start.month0() as i32;
            let m1 = end.year() * 12 + end.month0() as i32;
            let step = tick_step(m0 as f64, m1 as f64, count).max(1.0) as i32;
            let step = [1, 2, 3, 6, 12].into_iter().find(|s| *s >= step).unwrap_or(12);
            let ticks: Vec<(f64, String)> = (m0..=m1)
                .filter(|m| m.rem_euclid(step) == 0)
                .filter_map(|m| {
                    NaiveDate::from_ymd_opt(m.div_euclid(12), m.rem_euclid(12) as u32 + 1, 1)?
                        .and_hms_opt(0, 0, 0)
                })
                .map(seconds)
                .filter(|s| *s >= lo && *s <= hi)
                .map(|s| (s, format_seconds(s, "%b %Y")))
                .collect();
            if ticks.len() >= 2 {
                return ticks;
            }
        }

        let (unit, format) = if span_days >= 2.0 {
            (SECONDS_PER_DAY, "%b %d")
        } else {
            (SECONDS_PER_HOUR, "%H:%M")
        };
        let step = tick_step(lo / unit, hi / unit, count).max(1.0) * unit;
        let Some(indices) = tick_indices(lo, hi, step, count) else {
            return Vec::new();
        };
        indices
            .map(|i| i as f64 * step)
            .map(|s| (s, format_seconds(s, format)))
            .collect()
    }
}

fn seconds(value: NaiveDateTime) -> f64 {
    value.and_utc().timestamp() as f64
}

fn from_seconds(value: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(value.round() as i64, 0).map(|dt| dt.naive_utc())
}

fn format_seconds(value: f64, format: &str) -> String {
    from_seconds(value)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_default()
}

/// Maps values to arc spans covering a full turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularScale {
    arcs: Vec<(f32, f32)>,
    total: f64,
}

impl AngularScale {
    /// Non-positive values get an empty arc; when nothing is positive the
    /// turn is split evenly.
    pub fn new(values: &[f64]) -> Self {
        let full = std::f32::consts::TAU;
        let total: f64 = values.iter().filter(|v| v.is_finite()).map(|v| v.max(0.0)).sum();
        let mut arcs = Vec::with_capacity(values.len());
        let mut angle = 0.0f32;
        for value in values {
            let span = if total > 0.0 {
                let v = if value.is_finite() { value.max(0.0) } else { 0.0 };
                (v / total) as f32 * full
            } else {
                full / values.len().max(1) as f32
            };
            arcs.push((angle, angle + span));
            angle += span;
        }
        if let Some(last) = arcs.last_mut()
            && total > 0.0
        {
            last.1 = full;
        }
        Self { arcs, total }
    }

    pub fn arcs(&self) -> &[(f32, f32)] {
        &self.arcs
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Share of the total in percent.
    pub fn percent(&self, value: f64) -> f64 {
        if self.total > 0.0 {
            value.max(0.0) / self.total * 100.0
        } else {
            100.0 / self.arcs.len().max(1) as f64
        }
    }
}

/// Labels for a run of ticks spaced `step` apart. Abbreviated labels
/// are kept only while they stay distinct; otherwise every label is
/// written in full with as many decimals as the step needs.
pub fn tick_labels(ticks: &[f64], step: f64, unit: Option<&str>) -> Vec<String> {
    let short: Vec<String> = ticks.iter().map(|v| format_value(*v, unit)).collect();
    if short.windows(2).all(|pair| pair[0] != pair[1]) {
        return short;
    }
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).clamp(0.0, 12.0) as usize
    } else {
        0
    };
    ticks
        .iter()
        .map(|v| {
            let mut number = format!("{v:.decimals$}");
            if number.contains('.') {
                number = number.trim_end_matches('0').trim_end_matches('.').to_string();
            }
            if number == "-0" {
                number = "0".to_string();
            }
            with_unit(number, unit)
        })
        .collect()
}

/// Formats a value for ticks and labels, abbreviating large magnitudes.
pub fn format_value(value: f64, unit: Option<&str>) -> String {
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e9 {
        (value / 1e9, "B")
    } else if magnitude >= 1e6 {
        (value / 1e6, "M")
    } else if magnitude >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    let mut number = format!("{:.2}", scaled);
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    if number == "-0" {
        number = "0".to_string();
    }
    with_unit(format!("{number}{suffix}"), unit)
}

fn with_unit(number: String, unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        None => number,
        Some(unit @ ("$" | "€" | "£" | "¥")) => match number.strip_prefix('-') {
            Some(rest) => format!("-{unit}{rest}"),
            None => format!("{unit}{number}"),
        },
        Some("%") => format!("{number}%"),
        Some(unit) => format!("{number} {unit}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_width_domain_is_widened() {
        let scale = LinearScale::from_values([5.0, 5.0], false, (0.0, 100.0));
        assert_eq!(scale.domain(), (4.5, 5.5));
        assert!(scale.map(5.0).is_finite());

        let empty = LinearScale::from_values(Vec::<f64>::new(), true, (0.0, 100.0));
        assert_eq!(empty.domain(), (0.0, 1.0));

        let zeros = LinearScale::from_values([0.0, 0.0], true, (0.0, 100.0));
        assert_eq!(zeros.domain(), (0.0, 1.0));
    }

    #[test]
    fn inverted_range_maps_upward() {
        let scale = LinearScale::new((0.0, 20.0), (400.0, 0.0));
        assert_eq!(scale.map(0.0), 400.0);
        assert_eq!(scale.map(20.0), 0.0);
        assert_eq!(scale.map(10.0), 200.0);
    }

    #[test]
    fn nice_domain_and_ticks() {
        let scale = LinearScale::new((0.0, 19.3), (0.0, 100.0)).nice(5);
        assert_eq!(scale.domain(), (0.0, 20.0));
        assert_eq!(scale.ticks(5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);

        let fractional = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        let ticks = fractional.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert!((ticks[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn huge_domains_keep_ticks_bounded() {
        let scale = LinearScale::new((-1e308, 1e308), (0.0, 100.0)).nice(5);
        let (lo, hi) = scale.domain();
        assert!(lo.is_finite() && hi.is_finite() && (hi - lo).is_finite());
        let ticks = scale.ticks(5);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 5 * TICKS_PER_COUNT + 1);

        let extreme = LinearScale::new((f64::MIN, f64::MAX), (0.0, 100.0));
        assert!(extreme.ticks(5).len() <= 5 * TICKS_PER_COUNT + 1);
        assert!(extreme.map(0.0).is_finite());
    }

    #[test]
    fn tick_labels_stay_distinct() {
        let years = [2019.0, 2019.5, 2020.0, 2020.5, 2021.0, 2021.5, 2022.0];
        let labels = tick_labels(&years, 0.5, None);
        assert_eq!(labels[0], "2019");
        assert_eq!(labels[1], "2019.5");
        assert!(labels.windows(2).all(|pair| pair[0] != pair[1]));

        let thousands = tick_labels(&[0.0, 1000.0, 2000.0], 1000.0, Some("$"));
        assert_eq!(thousands, vec!["$0", "$1K", "$2K"]);
    }

    #[test]
    fn band_slots_cover_range() {
        let cats: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let band = BandScale::new(cats, (0.0, 300.0), 0.2, 0.1);
        assert_eq!(band.len(), 3);
        let step = band.step();
        assert!((band.slot(0) - step * 0.1).abs() < 1e-3);
        assert!(band.position("B").expect("B") > band.position("A").expect("A"));
        assert!(band.center("missing").is_none());
    }

    #[test]
    fn time_ticks_by_year_and_month() {
        let start = NaiveDate::from_ymd_opt(2015, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("start");
        let end = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("end");
        let scale = TimeScale::new(start, end, (0.0, 500.0));
        let ticks = scale.ticks(5);
        assert!(ticks.len() >= 2);
        assert!(ticks.iter().all(|(_, label)| label.len() == 4));

        let end = NaiveDate::from_ymd_opt(2015, 9, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("end");
        let scale = TimeScale::new(start, end, (0.0, 500.0));
        let ticks = scale.ticks(5);
        assert!(ticks.iter().any(|(_, label)| label == "Jun 2015"));
    }

    #[test]
    fn single_instant_time_domain_is_widened() {
        let instant = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("instant");
        let scale = TimeScale::new(instant, instant, (0.0, 200.0));
        assert!((scale.map(instant) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn angular_scale_spans() {
        let scale = AngularScale::new(&[1.0, 1.0, 2.0]);
        let arcs = scale.arcs();
        assert!((arcs[2].1 - std::f32::consts::TAU).abs() < 1e-5);
        assert!((arcs[2].1 - arcs[2].0 - std::f32::consts::PI).abs() < 1e-5);
        assert_eq!(scale.percent(2.0), 50.0);

        let zero = AngularScale::new(&[0.0, 0.0]);
        assert!((zero.arcs()[0].1 - std::f32::consts::PI).abs() < 1e-5);

        let negative = AngularScale::new(&[-3.0, 3.0]);
        assert_eq!(negative.arcs()[0].0, negative.arcs()[0].1);
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(1200.0, None), "1.2K");
        assert_eq!(format_value(20.0, Some("$")), "$20");
        assert_eq!(format_value(-1500.0, Some("$")), "-$1.5K");
        assert_eq!(format_value(45.5, Some("%")), "45.5%");
        assert_eq!(format_value(3.0, Some("kg")), "3 kg");
        assert_eq!(format_value(-0.0001, None), "0");
        assert_eq!(format_value(2_500_000.0, None), "2.5M");
    }

    proptest! {
        #[test]
        fn band_slots_are_distinct_and_sum_to_inner_range(
            n in 1usize..60,
            span in 50.0f32..2000.0,
            inner in 0.0f32..0.5,
            outer in 0.0f32..0.5,
        ) {
            let cats: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
            let band = BandScale::new(cats, (0.0, span), inner, outer);
            for i in 1..n {
                prop_assert!(band.slot(i) >= band.slot(i - 1) + band.bandwidth() - 1e-3);
            }
            let used = n as f32 * band.bandwidth() + (n as f32 - 1.0) * band.step() * inner;
            let expected = span - 2.0 * outer * band.step();
            if (n as f32 - inner + 2.0 * outer) >= 1.0 {
                prop_assert!((used - expected).abs() < 1e-2 * span.max(1.0) / 100.0 + 1e-2);
            }
            prop_assert!(band.slot(0) >= -1e-3);
            prop_assert!(band.slot(n - 1) + band.bandwidth() <= span + 1e-2);
        }
    }
}
