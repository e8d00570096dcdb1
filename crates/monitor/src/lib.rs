//! LLM performance monitoring and anomaly detection engine
//!
//! Ingests per-model metric series (response time, cost, tokens,
//! requests), classifies trend direction via regression, flags
//! statistically distant points with severities, aggregates the results
//! into one report per analysis request, and renders a narrative for it —
//! AI-backed when an external chat capability is configured, templated
//! otherwise. A thin axum boundary exposes the engine over HTTP.

pub mod analysis;
pub mod audit;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod narrative;
pub mod series;
pub mod usage;

pub use analysis::{
    detect_anomalies, detect_trend, AnalyticsAggregator, Anomaly, MetricAverages,
    PerformanceAnalytics, PrimaryModelPolicy, Severity, Trend, TrendSummary,
    ANOMALY_THRESHOLD_MULTIPLIER, DEFAULT_THRESHOLD_MULTIPLIER, MIN_SAMPLES, SLOPE_THRESHOLD,
};

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};

pub use config::{MonitorConfig, NarrativeConfig, ServerConfig};

pub use error::{Error, Result};

pub use handler::{
    AnalysisData, AnalysisHandler, AnalysisMetadata, AnalysisOutcome, AnalysisRequest,
};

pub use http::{router, AppState};

pub use narrative::{
    AnalysisKind, ChatCompletion, ChatOutput, ChatRequest, Narrative, NarrativeGeneration,
    NarrativeSource, NarrativeSynthesizer,
};

pub use series::{MetricKind, SampleSeriesProvider, SeriesProvider, TimeSeries};

pub use usage::{ModelUsage, ServiceHealth, ServiceStatus, ServiceStatusDetails};
