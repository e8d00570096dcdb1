//! Trend detection, anomaly detection and aggregate analytics

pub mod aggregator;
pub mod anomaly;
pub mod stats;
pub mod trend;

pub use aggregator::{
    AnalyticsAggregator, MetricAverages, PerformanceAnalytics, PrimaryModelPolicy, TrendSummary,
    ANOMALY_THRESHOLD_MULTIPLIER,
};
pub use anomaly::{
    detect_anomalies, Anomaly, Severity, DEFAULT_THRESHOLD_MULTIPLIER, MIN_SAMPLES,
};
pub use trend::{detect_trend, Trend, SLOPE_THRESHOLD};
