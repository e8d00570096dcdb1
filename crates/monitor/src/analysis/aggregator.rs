//! Aggregate analytics over resolved model series
//!
//! Combines per-series averages, derived per-request ratios, trend
//! classifications and anomaly lists into one report per analysis request.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::anomaly::{detect_anomalies, Anomaly};
use super::stats::mean;
use super::trend::{detect_trend, Trend};
use crate::error::{Error, Result};
use crate::series::{MetricKind, TimeSeries};

/// Detection band multiplier used for aggregate reports.
///
/// Wider than the standalone detector default on purpose; production
/// reports tolerate more dispersion before flagging.
pub const ANOMALY_THRESHOLD_MULTIPLIER: f64 = 2.5;

/// Which resolved series carries the detailed averages and trends.
///
/// Multi-model requests get aggregate numbers for a single primary model;
/// per-model aggregates are an extension point, not current behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimaryModelPolicy {
    /// The first resolved series is the primary model
    #[default]
    First,
}

impl PrimaryModelPolicy {
    pub fn select<'a>(&self, series: &'a [TimeSeries]) -> Option<&'a TimeSeries> {
        match self {
            PrimaryModelPolicy::First => series.first(),
        }
    }
}

/// Averages over the primary model's window.
///
/// The per-request ratios divide by the average request volume; a window
/// with zero requests therefore yields non-finite values, which propagate
/// as-is for the caller to guard against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAverages {
    pub tokens_per_request: f64,
    pub cost_per_request: f64,
    pub response_time: f64,
}

/// Trend classification of the primary model's cost, usage and latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub cost_trend: Trend,
    pub usage_trend: Trend,
    pub response_time_trend: Trend,
}

/// One aggregate report per analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalytics {
    pub averages: MetricAverages,
    pub trends: TrendSummary,
    pub anomalies: Vec<Anomaly>,
}

/// Merges detector outputs into a [`PerformanceAnalytics`] report
#[derive(Debug, Clone)]
pub struct AnalyticsAggregator {
    pub primary_model_policy: PrimaryModelPolicy,
    pub anomaly_threshold_multiplier: f64,
}

impl Default for AnalyticsAggregator {
    fn default() -> Self {
        Self {
            primary_model_policy: PrimaryModelPolicy::First,
            anomaly_threshold_multiplier: ANOMALY_THRESHOLD_MULTIPLIER,
        }
    }
}

impl AnalyticsAggregator {
    /// Build the aggregate report for a resolved series set.
    ///
    /// Fails with [`Error::InsufficientData`] when no series resolved.
    /// When anomaly detection is disabled the report carries an empty
    /// anomaly list regardless of series content.
    pub fn aggregate(
        &self,
        series_list: &[TimeSeries],
        include_anomaly_detection: bool,
    ) -> Result<PerformanceAnalytics> {
        let primary = self
            .primary_model_policy
            .select(series_list)
            .ok_or_else(|| {
                Error::InsufficientData("no series available for aggregation".to_string())
            })?;

        let avg_requests = mean(&primary.requests_series);
        let averages = MetricAverages {
            tokens_per_request: mean(&primary.tokens_series) / avg_requests,
            cost_per_request: mean(&primary.cost_series) / avg_requests,
            response_time: mean(&primary.response_time_series),
        };

        let trends = TrendSummary {
            cost_trend: detect_trend(&primary.cost_series),
            usage_trend: detect_trend(&primary.requests_series),
            response_time_trend: detect_trend(&primary.response_time_series),
        };

        let anomalies = if include_anomaly_detection {
            self.detect_primary_anomalies(primary)
        } else {
            Vec::new()
        };

        debug!(
            model = %primary.model,
            points = primary.len(),
            anomalies = anomalies.len(),
            "aggregated performance analytics"
        );

        Ok(PerformanceAnalytics {
            averages,
            trends,
            anomalies,
        })
    }

    /// Run the anomaly detector over cost, requests and response time of
    /// the primary series, preserving metric provenance in that order.
    fn detect_primary_anomalies(&self, primary: &TimeSeries) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for metric in [MetricKind::Cost, MetricKind::Requests, MetricKind::ResponseTime] {
            anomalies.extend(detect_anomalies(
                primary.metric(metric),
                &primary.time_points,
                metric,
                self.anomaly_threshold_multiplier,
            ));
        }
        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::anomaly::Severity;

    fn series(model: &str, n: usize) -> TimeSeries {
        TimeSeries {
            model: model.to_string(),
            time_points: (1..=n).map(|i| format!("2024-05-{i:02}")).collect(),
            response_time_series: vec![0.8; n],
            cost_series: (0..n).map(|i| 100.0 + i as f64).collect(),
            tokens_series: vec![1_200_000.0; n],
            requests_series: vec![1_000.0; n],
        }
    }

    #[test]
    fn test_empty_series_list_is_insufficient_data() {
        let aggregator = AnalyticsAggregator::default();
        let err = aggregator.aggregate(&[], true).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_disabled_anomaly_detection_yields_empty_list() {
        let aggregator = AnalyticsAggregator::default();
        let mut s = series("gpt-4", 10);
        s.cost_series[9] = 100_000.0; // would be flagged if detection ran
        let analytics = aggregator.aggregate(&[s], false).unwrap();
        assert!(analytics.anomalies.is_empty());
    }

    #[test]
    fn test_averages_and_ratios() {
        let aggregator = AnalyticsAggregator::default();
        let analytics = aggregator.aggregate(&[series("gpt-4", 10)], false).unwrap();
        assert_eq!(analytics.averages.tokens_per_request, 1_200.0);
        // mean cost over 100..=109 is 104.5, over 1000 requests/day
        assert!((analytics.averages.cost_per_request - 0.1045).abs() < 1e-12);
        assert_eq!(analytics.averages.response_time, 0.8);
    }

    #[test]
    fn test_trends_of_primary_series() {
        let aggregator = AnalyticsAggregator::default();
        let analytics = aggregator.aggregate(&[series("gpt-4", 10)], false).unwrap();
        assert_eq!(analytics.trends.cost_trend, Trend::Increasing);
        assert_eq!(analytics.trends.usage_trend, Trend::Stable);
        assert_eq!(analytics.trends.response_time_trend, Trend::Stable);
    }

    #[test]
    fn test_only_first_series_is_aggregated() {
        let aggregator = AnalyticsAggregator::default();
        let mut secondary = series("gpt-3.5-turbo", 10);
        secondary.tokens_series = vec![1.0; 10];
        let analytics = aggregator
            .aggregate(&[series("gpt-4", 10), secondary], false)
            .unwrap();
        assert_eq!(analytics.averages.tokens_per_request, 1_200.0);
    }

    #[test]
    fn test_anomalies_carry_metric_provenance() {
        let aggregator = AnalyticsAggregator::default();
        let mut s = series("gpt-4", 20);
        s.response_time_series[13] = 40.0;
        let analytics = aggregator.aggregate(&[s], true).unwrap();

        assert_eq!(analytics.anomalies.len(), 1);
        let anomaly = &analytics.anomalies[0];
        assert_eq!(anomaly.metric, MetricKind::ResponseTime);
        assert_eq!(anomaly.timestamp, "2024-05-14");
        assert_eq!(anomaly.severity, Severity::High);
    }

    #[test]
    fn test_zero_request_volume_propagates_non_finite_ratios() {
        let aggregator = AnalyticsAggregator::default();
        let mut s = series("gpt-4", 10);
        s.requests_series = vec![0.0; 10];
        let analytics = aggregator.aggregate(&[s], false).unwrap();
        assert!(!analytics.averages.tokens_per_request.is_finite());
        assert!(!analytics.averages.cost_per_request.is_finite());
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let aggregator = AnalyticsAggregator::default();
        let analytics = aggregator.aggregate(&[series("gpt-4", 10)], false).unwrap();
        let json = serde_json::to_value(&analytics).unwrap();
        assert!(json["averages"]["tokensPerRequest"].is_number());
        assert_eq!(json["trends"]["costTrend"], "increasing");
        assert!(json["anomalies"].as_array().unwrap().is_empty());
    }
}
