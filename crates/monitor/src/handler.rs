//! Analysis request orchestration
//!
//! The handler is the engine's boundary: it validates the request,
//! resolves series, runs aggregation and narrative synthesis, and emits
//! exactly one audit activity per successful analysis. Failure paths emit
//! no audit record; they are logged and surfaced as typed errors.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::{AnalyticsAggregator, PerformanceAnalytics};
use crate::audit::{AuditEvent, AuditSink};
use crate::error::{Error, Result};
use crate::narrative::{AnalysisKind, NarrativeSynthesizer};
use crate::series::{SeriesProvider, TimeSeries};

/// One validated-at-the-boundary analysis request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Model filter; `None` analyzes every known model
    pub models: Option<Vec<String>>,
    pub analysis_kind: AnalysisKind,
    pub include_anomaly_detection: bool,
    /// Most recent number of points to analyze per series
    pub period: Option<usize>,
}

impl AnalysisRequest {
    pub fn new(analysis_kind: AnalysisKind) -> Self {
        Self {
            models: None,
            analysis_kind,
            include_anomaly_detection: false,
            period: None,
        }
    }
}

/// The analysis payload returned to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    /// Fresh opaque identifier; not persisted, not unique across restarts
    pub analysis_id: Uuid,
    pub performance_analytics: PerformanceAnalytics,
    pub historical_data: Vec<TimeSeries>,
    #[serde(rename = "aiInsights")]
    pub narrative: String,
}

/// Request-level response metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub analyzed_models: Vec<String>,
    pub generated_at: String,
}

/// Successful analysis result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub data: AnalysisData,
    pub metadata: AnalysisMetadata,
}

/// Orchestrates one analysis per call; stateless between calls
pub struct AnalysisHandler {
    provider: Arc<dyn SeriesProvider>,
    audit: Arc<dyn AuditSink>,
    synthesizer: NarrativeSynthesizer,
    aggregator: AnalyticsAggregator,
}

impl AnalysisHandler {
    pub fn new(
        provider: Arc<dyn SeriesProvider>,
        audit: Arc<dyn AuditSink>,
        synthesizer: NarrativeSynthesizer,
    ) -> Self {
        Self {
            provider,
            audit,
            synthesizer,
            aggregator: AnalyticsAggregator::default(),
        }
    }

    /// Run one analysis.
    ///
    /// The pipeline is strictly linear: resolve, aggregate, synthesize,
    /// audit. The audit record is emitted after synthesis succeeds and
    /// never on an error path.
    pub async fn handle(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        self.validate(request)?;

        let result = self.run(request).await;
        if let Err(err) = &result {
            error!(
                models = ?request.models,
                kind = %request.analysis_kind,
                %err,
                "analysis request failed"
            );
        }
        result
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        if let Some(period) = request.period {
            if period == 0 {
                return Err(Error::InvalidRequest(
                    "period must be a positive number of points".to_string(),
                ));
            }
        }
        if let Some(models) = &request.models {
            if models.is_empty() || models.iter().any(|m| m.trim().is_empty()) {
                return Err(Error::InvalidRequest(
                    "model filter must contain non-empty model names".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        let resolved = self.provider.get_series(request.models.as_deref()).await?;
        let series: Vec<TimeSeries> = match request.period {
            Some(period) => resolved.iter().map(|s| s.recent(period)).collect(),
            None => resolved,
        };

        if series.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no series resolved for models {:?}",
                request.models.as_deref().unwrap_or_default()
            )));
        }
        for s in &series {
            s.validate()?;
        }

        let analytics = self
            .aggregator
            .aggregate(&series, request.include_anomaly_detection)?;
        let narrative = self
            .synthesizer
            .synthesize_report(request.analysis_kind, &analytics, &series)
            .await?;

        let analyzed_models: Vec<String> = series.iter().map(|s| s.model.clone()).collect();
        let generated_at = Utc::now().to_rfc3339();

        self.audit
            .record(AuditEvent {
                action: "performance_analysis_completed".to_string(),
                entity_type: "monitoring".to_string(),
                details: format!(
                    "performance analysis of {} model(s), kind: {}",
                    analyzed_models.len(),
                    request.analysis_kind
                ),
                metadata: json!({
                    "models": analyzed_models,
                    "anomalyCount": analytics.anomalies.len(),
                    "analysisKind": request.analysis_kind.as_str(),
                    "timestamp": generated_at,
                }),
            })
            .await;

        info!(
            models = analyzed_models.len(),
            anomalies = analytics.anomalies.len(),
            kind = %request.analysis_kind,
            "analysis completed"
        );

        Ok(AnalysisOutcome {
            data: AnalysisData {
                analysis_id: Uuid::new_v4(),
                performance_analytics: analytics,
                historical_data: series,
                narrative: narrative.content,
            },
            metadata: AnalysisMetadata {
                analyzed_models,
                generated_at,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::config::NarrativeConfig;
    use crate::narrative::{ChatCompletion, ChatOutput, ChatRequest};
    use crate::series::SampleSeriesProvider;
    use async_trait::async_trait;

    struct FailingChat;

    #[async_trait]
    impl ChatCompletion for FailingChat {
        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(&self, _request: ChatRequest) -> Result<ChatOutput> {
            Err(Error::NarrativeGeneration("upstream unavailable".to_string()))
        }
    }

    fn handler_with(audit: Arc<InMemoryAuditSink>) -> AnalysisHandler {
        AnalysisHandler::new(
            Arc::new(SampleSeriesProvider::with_demo_data()),
            audit,
            NarrativeSynthesizer::templated(NarrativeConfig::default()),
        )
    }

    fn comprehensive() -> AnalysisRequest {
        AnalysisRequest {
            models: None,
            analysis_kind: AnalysisKind::Comprehensive,
            include_anomaly_detection: true,
            period: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_over_demo_models() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        let outcome = handler.handle(&comprehensive()).await.unwrap();

        assert_eq!(outcome.data.historical_data.len(), 4);
        assert_eq!(outcome.metadata.analyzed_models[0], "gpt-4");
        assert!(!outcome.data.narrative.is_empty());

        // analytics reflect the first resolved model only
        let primary = &outcome.data.historical_data[0];
        let expected_rt =
            primary.response_time_series.iter().sum::<f64>() / primary.len() as f64;
        let got = outcome.data.performance_analytics.averages.response_time;
        assert!((got - expected_rt).abs() < 1e-12);

        // the injected gpt-4 spike must surface
        assert!(!outcome.data.performance_analytics.anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_exactly_one_audit_record_per_success() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        handler.handle(&comprehensive()).await.unwrap();
        assert_eq!(audit.len(), 1);
        let event = &audit.events()[0];
        assert_eq!(event.action, "performance_analysis_completed");
        assert_eq!(event.entity_type, "monitoring");
        assert_eq!(event.metadata["analysisKind"], "comprehensive");

        handler.handle(&comprehensive()).await.unwrap();
        assert_eq!(audit.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_models_fail_with_insufficient_data_and_no_audit() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        let mut request = comprehensive();
        request.models = Some(vec!["unknown-model".to_string()]);
        let err = handler.handle(&request).await.unwrap_err();

        assert!(matches!(err, Error::InsufficientData(_)));
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_period_is_rejected_without_audit() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        let mut request = comprehensive();
        request.period = Some(0);
        let err = handler.handle(&request).await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn test_blank_model_name_is_rejected() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        let mut request = AnalysisRequest::new(AnalysisKind::Optimization);
        request.models = Some(vec!["  ".to_string()]);
        let err = handler.handle(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_period_truncates_each_series() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = handler_with(audit.clone());

        let mut request = comprehensive();
        request.period = Some(7);
        let outcome = handler.handle(&request).await.unwrap();

        for series in &outcome.data.historical_data {
            assert_eq!(series.len(), 7);
        }
    }

    #[tokio::test]
    async fn test_narrative_failure_surfaces_and_skips_audit() {
        let audit = Arc::new(InMemoryAuditSink::new());
        let handler = AnalysisHandler::new(
            Arc::new(SampleSeriesProvider::with_demo_data()),
            audit.clone(),
            NarrativeSynthesizer::new(
                Some(Arc::new(FailingChat)),
                NarrativeConfig::default(),
            ),
        );

        let err = handler.handle(&comprehensive()).await.unwrap_err();
        assert!(matches!(err, Error::NarrativeGeneration(_)));
        assert!(audit.is_empty());
    }
}
