//! Trend classification via regression slope

use serde::{Deserialize, Serialize};

use super::stats::ols_slope;

/// Slope magnitude below which a series counts as stable.
///
/// The threshold is applied to the raw slope and is therefore
/// metric-scale-dependent; it is kept as-is for compatibility with the
/// historical classification.
pub const SLOPE_THRESHOLD: f64 = 0.01;

/// Coarse direction of a series over its observed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the direction of a series.
///
/// Fits an ordinary least-squares line over `values` indexed `0..n` and
/// buckets the slope against [`SLOPE_THRESHOLD`]. Zero or one points
/// classify as [`Trend::Stable`]. Pure and deterministic.
pub fn detect_trend(values: &[f64]) -> Trend {
    match ols_slope(values) {
        Some(slope) if slope > SLOPE_THRESHOLD => Trend::Increasing,
        Some(slope) if slope < -SLOPE_THRESHOLD => Trend::Decreasing,
        _ => Trend::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single_point_are_stable() {
        assert_eq!(detect_trend(&[]), Trend::Stable);
        assert_eq!(detect_trend(&[5.0]), Trend::Stable);
    }

    #[test]
    fn test_rising_series_is_increasing() {
        assert_eq!(detect_trend(&[1.0, 2.0, 3.0, 4.0, 5.0]), Trend::Increasing);
    }

    #[test]
    fn test_falling_series_is_decreasing() {
        assert_eq!(detect_trend(&[5.0, 4.0, 3.0, 2.0, 1.0]), Trend::Decreasing);
    }

    #[test]
    fn test_flat_series_is_stable() {
        assert_eq!(detect_trend(&[2.0, 2.0, 2.0, 2.0]), Trend::Stable);
    }

    #[test]
    fn test_slope_inside_threshold_is_stable() {
        // slope of 0.005 per step sits inside the +/-0.01 dead band
        let values: Vec<f64> = (0..20).map(|i| 1.0 + 0.005 * i as f64).collect();
        assert_eq!(detect_trend(&values), Trend::Stable);
    }

    #[test]
    fn test_determinism() {
        let values = [0.3, 1.9, 0.7, 2.8, 1.1, 3.5];
        let first = detect_trend(&values);
        for _ in 0..10 {
            assert_eq!(detect_trend(&values), first);
        }
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&Trend::Increasing).unwrap(),
            "\"increasing\""
        );
        assert_eq!(serde_json::to_string(&Trend::Stable).unwrap(), "\"stable\"");
    }
}
