//! Model time series and the series provider boundary
//!
//! A [`TimeSeries`] carries the aligned per-day metric streams for one
//! model. Series are resolved fresh for every analysis request through the
//! [`SeriesProvider`] trait; the engine never owns the underlying metric
//! store.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The metric streams tracked per model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    /// Average response time in seconds
    ResponseTime,
    /// Cost in USD
    Cost,
    /// Token volume
    Tokens,
    /// Request volume
    Requests,
}

impl MetricKind {
    /// Wire/label name of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::ResponseTime => "responseTime",
            MetricKind::Cost => "cost",
            MetricKind::Tokens => "tokens",
            MetricKind::Requests => "requests",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aligned metric history for one model.
///
/// Invariant: every series has exactly one sample per entry of
/// `time_points`, and index `i` of each series refers to `time_points[i]`.
/// Instances are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub model: String,
    /// Ascending, unique date strings (`YYYY-MM-DD`)
    pub time_points: Vec<String>,
    pub response_time_series: Vec<f64>,
    pub cost_series: Vec<f64>,
    pub tokens_series: Vec<f64>,
    pub requests_series: Vec<f64>,
}

impl TimeSeries {
    /// Number of aligned samples
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    /// Check the index-alignment invariant
    pub fn validate(&self) -> Result<()> {
        let n = self.time_points.len();
        let aligned = self.response_time_series.len() == n
            && self.cost_series.len() == n
            && self.tokens_series.len() == n
            && self.requests_series.len() == n;
        if aligned {
            Ok(())
        } else {
            Err(Error::SeriesProvider(format!(
                "misaligned series for model {}: {} time points",
                self.model, n
            )))
        }
    }

    /// The samples for one metric
    pub fn metric(&self, kind: MetricKind) -> &[f64] {
        match kind {
            MetricKind::ResponseTime => &self.response_time_series,
            MetricKind::Cost => &self.cost_series,
            MetricKind::Tokens => &self.tokens_series,
            MetricKind::Requests => &self.requests_series,
        }
    }

    /// A copy holding only the most recent `n` samples.
    ///
    /// Used by the request handler to apply the `period` filter; a window
    /// wider than the series returns the series unchanged.
    pub fn recent(&self, n: usize) -> TimeSeries {
        if n >= self.len() {
            return self.clone();
        }
        let start = self.len() - n;
        TimeSeries {
            model: self.model.clone(),
            time_points: self.time_points[start..].to_vec(),
            response_time_series: self.response_time_series[start..].to_vec(),
            cost_series: self.cost_series[start..].to_vec(),
            tokens_series: self.tokens_series[start..].to_vec(),
            requests_series: self.requests_series[start..].to_vec(),
        }
    }
}

/// Source of model metric histories.
///
/// Implementations resolve the series for the requested models; unknown
/// model names are silently omitted rather than treated as errors. Callers
/// decide whether an empty result is fatal.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Resolve series for the named models, or all known models when
    /// `models` is `None`. Requested order is preserved.
    async fn get_series(&self, models: Option<&[String]>) -> Result<Vec<TimeSeries>>;
}

/// In-memory provider backed by a fixed set of series.
///
/// Carries the demo dataset in lieu of a live metric store; also the
/// provider used throughout the test suite.
#[derive(Debug, Clone, Default)]
pub struct SampleSeriesProvider {
    series: Vec<TimeSeries>,
}

impl SampleSeriesProvider {
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self { series }
    }

    /// Provider seeded with 30 daily points for four demo models.
    ///
    /// Values are generated deterministically around the usage levels of
    /// the demo usage table; `gpt-4` carries one injected response-time
    /// spike so anomaly detection has something to find.
    pub fn with_demo_data() -> Self {
        let specs: [(&str, [f64; 2], [f64; 2], [f64; 2], [f64; 2]); 4] = [
            // model, [rt base, rt drift], [cost base, drift], [tokens base, drift], [requests base, drift]
            ("gpt-4", [0.92, -0.003], [126.0, 0.4], [1_245_000.0, 4_000.0], [980.0, 4.0]),
            ("gpt-3.5-turbo", [0.45, 0.002], [18.4, 0.05], [905_000.0, 2_500.0], [1_480.0, 6.0]),
            ("claude-2", [1.08, 0.004], [61.5, -0.2], [698_000.0, 1_500.0], [410.0, 1.5]),
            ("llama-2-70b", [1.42, 0.006], [0.0, 0.0], [312_000.0, 800.0], [195.0, 0.8]),
        ];

        let series = specs
            .iter()
            .map(|(model, rt, cost, tokens, requests)| {
                let mut s = demo_series(model, *rt, *cost, *tokens, *requests, 30);
                if *model == "gpt-4" {
                    // one bad day, far outside the dispersion band
                    s.response_time_series[21] = 4.2;
                }
                s
            })
            .collect();

        Self::new(series)
    }
}

fn demo_series(
    model: &str,
    rt: [f64; 2],
    cost: [f64; 2],
    tokens: [f64; 2],
    requests: [f64; 2],
    days: usize,
) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid demo start date");
    let mut time_points = Vec::with_capacity(days);
    let mut response_time_series = Vec::with_capacity(days);
    let mut cost_series = Vec::with_capacity(days);
    let mut tokens_series = Vec::with_capacity(days);
    let mut requests_series = Vec::with_capacity(days);

    for i in 0..days {
        let date = start
            .checked_add_days(Days::new(i as u64))
            .expect("demo window stays in range");
        time_points.push(date.format("%Y-%m-%d").to_string());

        // deterministic day-to-day wobble in -2..=2
        let wobble = ((i * 7) % 5) as f64 - 2.0;
        let day = i as f64;
        response_time_series.push(rt[0] + rt[1] * day + 0.01 * wobble);
        cost_series.push((cost[0] + cost[1] * day + 0.6 * wobble).max(0.0));
        tokens_series.push(tokens[0] + tokens[1] * day + 1_800.0 * wobble);
        requests_series.push(requests[0] + requests[1] * day + 3.0 * wobble);
    }

    TimeSeries {
        model: model.to_string(),
        time_points,
        response_time_series,
        cost_series,
        tokens_series,
        requests_series,
    }
}

#[async_trait]
impl SeriesProvider for SampleSeriesProvider {
    async fn get_series(&self, models: Option<&[String]>) -> Result<Vec<TimeSeries>> {
        let resolved = match models {
            None => self.series.clone(),
            Some(names) => names
                .iter()
                .filter_map(|name| self.series.iter().find(|s| &s.model == name).cloned())
                .collect(),
        };
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_series_are_aligned() {
        let provider = SampleSeriesProvider::with_demo_data();
        let series = provider.get_series(None).await.unwrap();
        assert_eq!(series.len(), 4);
        for s in &series {
            assert_eq!(s.len(), 30);
            s.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_unknown_models_are_silently_omitted() {
        let provider = SampleSeriesProvider::with_demo_data();
        let models = vec!["gpt-4".to_string(), "no-such-model".to_string()];
        let series = provider.get_series(Some(&models)).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].model, "gpt-4");
    }

    #[tokio::test]
    async fn test_requested_order_is_preserved() {
        let provider = SampleSeriesProvider::with_demo_data();
        let models = vec!["claude-2".to_string(), "gpt-4".to_string()];
        let series = provider.get_series(Some(&models)).await.unwrap();
        let names: Vec<&str> = series.iter().map(|s| s.model.as_str()).collect();
        assert_eq!(names, vec!["claude-2", "gpt-4"]);
    }

    #[tokio::test]
    async fn test_recent_keeps_tail() {
        let provider = SampleSeriesProvider::with_demo_data();
        let series = provider.get_series(None).await.unwrap();
        let tail = series[0].recent(7);
        assert_eq!(tail.len(), 7);
        assert_eq!(
            tail.time_points.last(),
            series[0].time_points.last(),
            "tail must end at the same point as the full series"
        );
        assert_eq!(series[0].recent(500), series[0]);
    }

    #[test]
    fn test_validate_rejects_misaligned_series() {
        let mut series = demo_series("m", [1.0, 0.0], [1.0, 0.0], [1.0, 0.0], [1.0, 0.0], 5);
        series.cost_series.pop();
        assert!(series.validate().is_err());
    }
}
