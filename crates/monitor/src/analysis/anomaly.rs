//! Dispersion-based anomaly detection
//!
//! A point is anomalous when it falls outside the mean +/- k standard
//! deviations of its own series. The reported expected range is the
//! +/- 1 sigma band, intentionally narrower than the detection band; UI
//! consumers render it as the "normal" corridor around the mean.

use serde::{Deserialize, Serialize};

use super::stats::{mean, std_dev};
use crate::series::MetricKind;

/// Minimum number of samples before detection is attempted
pub const MIN_SAMPLES: usize = 5;

/// Detection band width when called standalone.
///
/// The aggregator passes its own multiplier (2.5); both call sites are
/// deliberate and must not be unified.
pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 2.0;

/// How far outside the dispersion band an anomalous point sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Bucket a deviation ratio `|value - mean| / sigma`.
    ///
    /// The high boundary is inclusive: a lone spike against an otherwise
    /// flat series lands exactly on ratio 3 and must still read as high.
    pub fn from_deviation_ratio(ratio: f64) -> Self {
        if ratio >= 3.0 {
            Severity::High
        } else if ratio > 2.5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A sample statistically distant from its series' central tendency.
///
/// Value object; duplicates are legitimate when the same point is flagged
/// by different analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub timestamp: String,
    pub metric: MetricKind,
    pub value: f64,
    /// `[max(0, mean - sigma), mean + sigma]`
    pub expected_range: [f64; 2],
    pub severity: Severity,
}

/// Flag the points of one metric series outside the dispersion band.
///
/// Detection uses `mean +/- threshold_multiplier * sigma` with the
/// population standard deviation. Fewer than [`MIN_SAMPLES`] points (or a
/// zero-variance series) yield an empty result; neither is an error.
/// Each point is flagged at most once per call. Pure and deterministic.
pub fn detect_anomalies(
    values: &[f64],
    time_points: &[String],
    metric: MetricKind,
    threshold_multiplier: f64,
) -> Vec<Anomaly> {
    if values.len() < MIN_SAMPLES {
        return Vec::new();
    }

    let mu = mean(values);
    let sigma = std_dev(values);
    if sigma == 0.0 {
        return Vec::new();
    }

    let lower = mu - threshold_multiplier * sigma;
    let upper = mu + threshold_multiplier * sigma;
    let expected_range = [(mu - sigma).max(0.0), mu + sigma];

    values
        .iter()
        .zip(time_points)
        .filter(|(&value, _)| value < lower || value > upper)
        .map(|(&value, timestamp)| {
            let ratio = (value - mu).abs() / sigma;
            Anomaly {
                timestamp: timestamp.clone(),
                metric,
                value,
                expected_range,
                severity: Severity::from_deviation_ratio(ratio),
            }
        })
        .collect()
}
