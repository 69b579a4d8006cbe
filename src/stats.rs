//! Descriptive statistics and the two-window trend signal.
//!
//! Everything here is a pure function of `(values, threshold)` — no clock,
//! no storage — so the engine property-tests independently of upload and
//! persistence logic. An empty series yields `None`: NaN and infinities
//! never leave this module, callers render their own fallbacks.

use serde::Serialize;

/// Direction of the two-window trend comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Trend between the first and second halves of a series.
///
/// The split point is `len / 2`; for odd lengths the extra element belongs
/// to the second half. `delta` is the signed difference of half-means
/// (second minus first), rounded to two decimals for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub delta: f64,
}

/// Summary statistics over one series against one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// `max - min`.
    pub variation: f64,
    /// Count of values at or above the threshold.
    pub normal_count: usize,
    /// Count of values below the threshold.
    pub notify_count: usize,
    pub trend: Trend,
}

impl SeriesStats {
    /// Compute statistics for `values` against `threshold`.
    ///
    /// Returns `None` for an empty series — the defined empty-state result
    /// mandated instead of the silent non-numeric output the old surface
    /// produced from `min`/`max` over no elements.
    pub fn compute(values: &[f64], threshold: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut normal_count = 0;

        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            if v >= threshold {
                normal_count += 1;
            }
        }

        Some(Self {
            min,
            max,
            average: sum / values.len() as f64,
            variation: max - min,
            normal_count,
            notify_count: values.len() - normal_count,
            trend: trend(values),
        })
    }

    /// Share of normal readings, rounded to one decimal for display.
    pub fn normal_pct(&self) -> f64 {
        percentage(self.normal_count, self.normal_count + self.notify_count)
    }

    /// Share of notify readings, rounded to one decimal for display.
    pub fn notify_pct(&self) -> f64 {
        percentage(self.notify_count, self.normal_count + self.notify_count)
    }
}

/// Two-window trend: mean of the second half versus mean of the first.
///
/// With fewer than two values one window is empty, so the series is
/// reported stable with a zero delta.
fn trend(values: &[f64]) -> Trend {
    let mid = values.len() / 2;
    if mid == 0 {
        return Trend {
            direction: TrendDirection::Stable,
            delta: 0.0,
        };
    }

    let first = mean(&values[..mid]);
    let second = mean(&values[mid..]);

    let direction = if second > first {
        TrendDirection::Increasing
    } else if second < first {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    Trend {
        direction,
        delta: round2(second - first),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// `count / total * 100`, rounded to one decimal. Zero when `total` is 0.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
