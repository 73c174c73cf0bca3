//! Bar chart data shared by the terminal charts and the file export.

use crate::views::{Dimension, Metric, StateBar};

/// One labelled bar chart. NaN values (undefined margins) are kept so the terminal can
/// show them as gaps, and skipped by the range and export code.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: String,
    pub value_label: String,
    pub bars: Vec<(String, f64)>,
}

impl BarSeries {
    pub fn new(
        title: impl Into<String>,
        value_label: impl Into<String>,
        bars: Vec<(String, f64)>,
    ) -> Self {
        Self {
            title: title.into(),
            value_label: value_label.into(),
            bars,
        }
    }

    pub fn from_dimension(dimension: Dimension, metric: Metric, bars: Vec<(String, f64)>) -> Self {
        Self::new(
            format!("{} by {}", metric.label(), dimension.label()),
            metric.label(),
            bars,
        )
    }

    /// State ranking labelled by state code.
    pub fn from_states(metric: Metric, states: &[StateBar]) -> Self {
        let metric = metric.for_states();
        Self::new(
            format!("{} by state", metric.label()),
            metric.label(),
            states
                .iter()
                .map(|s| (s.state_code.clone(), s.value))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.finite().next().is_none()
    }

    /// Bars with a finite value, with their position in the series.
    pub fn finite(&self) -> impl Iterator<Item = (usize, &str, f64)> + '_ {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, (_, v))| v.is_finite())
            .map(|(i, (label, v))| (i, label.as_str(), *v))
    }

    /// Value axis range. Always includes zero so bars grow from the baseline.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.finite().fold(None, |acc, (_, _, v)| match acc {
            None => Some((v.min(0.0), v.max(0.0))),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// File name stem for exports, e.g. `sales_by_state`.
    pub fn file_stem(&self) -> String {
        self.title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

/// Generate "nice" tick values in [min, max] with roughly max_ticks steps.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let range = if max > min { max - min } else { 1.0 };
    if max_ticks == 0 {
        return vec![min];
    }
    let raw_step = range / max_ticks as f64;
    let mag = 10.0_f64.powf(raw_step.log10().floor());
    let norm = raw_step / mag;
    let step = if norm <= 1.0 {
        mag
    } else if norm <= 2.0 {
        2.0 * mag
    } else if norm <= 5.0 {
        5.0 * mag
    } else {
        10.0 * mag
    };
    let start = (min / step).floor() * step;
    let mut ticks = Vec::new();
    let mut v = start;
    while v <= max + step * 0.001 && ticks.len() <= max_ticks + 2 {
        if v >= min - step * 0.001 {
            // snap values like 0.30000000000000004
            ticks.push((v / step).round() * step);
        }
        v += step;
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Compact label for a value: whole numbers without decimals, thousands as `k`.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    let abs = v.abs();
    if abs >= 10_000.0 {
        format!("{:.1}k", v / 1000.0)
    } else if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}
