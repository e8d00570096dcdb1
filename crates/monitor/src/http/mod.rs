//! HTTP boundary for the analysis engine
//!
//! Two routes: `POST /analysis` runs the full series pipeline through the
//! request handler, `POST /narrative` renders a narrative for a
//! caller-supplied monitoring snapshot. Errors map onto a flat
//! `{ success: false, error, message }` envelope.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

use crate::audit::{AuditEvent, AuditSink};
use crate::error::Error;
use crate::handler::{AnalysisData, AnalysisHandler, AnalysisMetadata, AnalysisRequest};
use crate::narrative::{AnalysisKind, NarrativeGeneration, NarrativeSynthesizer};
use crate::usage::{ModelUsage, ServiceStatus};

/// Shared state behind the routes
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<AnalysisHandler>,
    pub synthesizer: Arc<NarrativeSynthesizer>,
    pub audit: Arc<dyn AuditSink>,
}

/// Build the analysis API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analysis", post(analyze))
        .route("/narrative", post(narrate))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisBody {
    /// Single-model filter, kept for backwards compatibility
    model: Option<String>,
    /// Multi-model filter; takes precedence over `model`
    models: Option<Vec<String>>,
    /// One of the supported kinds; defaults to `comprehensive`
    analysis_type: Option<String>,
    include_anomaly_detection: Option<bool>,
    period: Option<usize>,
}

#[derive(Debug, Serialize)]
struct AnalysisResponse {
    success: bool,
    data: AnalysisData,
    metadata: AnalysisMetadata,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::InsufficientData(_) => StatusCode::NOT_FOUND,
        Error::NarrativeGeneration(_) => StatusCode::BAD_GATEWAY,
        Error::SeriesProvider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let envelope = ErrorEnvelope {
        success: false,
        error: err.code().to_string(),
        message: Some(err.to_string()),
    };
    (status, Json(envelope)).into_response()
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalysisBody>) -> Response {
    let analysis_kind = match body.analysis_type.as_deref() {
        None => AnalysisKind::Comprehensive,
        Some(raw) => match AnalysisKind::from_str(raw) {
            Ok(kind) => kind,
            Err(err) => return error_response(&err),
        },
    };

    let models = body
        .models
        .or_else(|| body.model.map(|model| vec![model]));

    let request = AnalysisRequest {
        models,
        analysis_kind,
        include_anomaly_detection: body.include_anomaly_detection.unwrap_or(false),
        period: body.period,
    };

    match state.handler.handle(&request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AnalysisResponse {
                success: true,
                data: outcome.data,
                metadata: outcome.metadata,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeBody {
    metrics: Vec<ModelUsage>,
    #[serde(default)]
    status_records: Vec<ServiceStatus>,
    analysis_type: String,
    user_id: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeResponse {
    success: bool,
    analysis_type: String,
    content: String,
    metadata: NarrativeMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

async fn narrate(State(state): State<AppState>, Json(body): Json<NarrativeBody>) -> Response {
    let kind = match AnalysisKind::from_str(&body.analysis_type) {
        Ok(kind) => kind,
        Err(err) => return error_response(&err),
    };

    match state
        .synthesizer
        .synthesize_snapshot(kind, &body.metrics, &body.status_records)
        .await
    {
        Ok(narrative) => {
            let (tokens_used, model_used, generation_method) = match &narrative.generation {
                NarrativeGeneration::AiBacked { model, tokens_used } => {
                    (Some(*tokens_used), Some(model.clone()), None)
                }
                NarrativeGeneration::Templated => (None, None, Some("fallback".to_string())),
            };

            state
                .audit
                .record(AuditEvent {
                    action: "ai_analysis_completed".to_string(),
                    entity_type: "monitoring".to_string(),
                    details: format!("narrative analysis of monitoring data, kind: {kind}"),
                    metadata: json!({
                        "analysisType": kind.as_str(),
                        "tokensUsed": tokens_used.unwrap_or(0),
                        "llmModelsCount": body.metrics.len(),
                        "servicesCount": body.status_records.len(),
                        "userId": body.user_id,
                    }),
                })
                .await;

            (
                StatusCode::OK,
                Json(NarrativeResponse {
                    success: true,
                    analysis_type: kind.as_str().to_string(),
                    content: narrative.content,
                    metadata: NarrativeMetadata {
                        tokens_used,
                        model_used,
                        generation_method,
                        error: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(kind = %kind, %err, "narrative analysis failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(NarrativeResponse {
                    success: false,
                    analysis_type: kind.as_str().to_string(),
                    content: "An error occurred while analyzing the monitoring data."
                        .to_string(),
                    metadata: NarrativeMetadata {
                        tokens_used: None,
                        model_used: None,
                        generation_method: None,
                        error: Some(err.to_string()),
                        timestamp: Utc::now().to_rfc3339(),
                    },
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::config::NarrativeConfig;
    use crate::series::SampleSeriesProvider;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> (AppState, Arc<InMemoryAuditSink>) {
        let audit = Arc::new(InMemoryAuditSink::new());
        let provider = Arc::new(SampleSeriesProvider::with_demo_data());
        let synthesizer = NarrativeSynthesizer::templated(NarrativeConfig::default());
        let handler = Arc::new(AnalysisHandler::new(
            provider,
            audit.clone(),
            NarrativeSynthesizer::templated(NarrativeConfig::default()),
        ));
        (
            AppState {
                handler,
                synthesizer: Arc::new(synthesizer),
                audit: audit.clone(),
            },
            audit,
        )
    }

    async fn post_json(state: AppState, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_analysis_happy_path() {
        let (state, audit) = test_state();
        let (status, body) = post_json(
            state,
            "/analysis",
            json!({ "includeAnomalyDetection": true }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["historicalData"].as_array().unwrap().len(), 4);
        assert!(body["data"]["analysisId"].is_string());
        assert!(!body["data"]["aiInsights"].as_str().unwrap().is_empty());
        assert!(
            !body["data"]["performanceAnalytics"]["anomalies"]
                .as_array()
                .unwrap()
                .is_empty()
        );
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn test_analysis_single_model_filter() {
        let (state, _) = test_state();
        let (status, body) = post_json(
            state,
            "/analysis",
            json!({ "model": "claude-2", "analysisType": "trends" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let history = body["data"]["historicalData"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["model"], "claude-2");
        assert_eq!(body["metadata"]["analyzedModels"][0], "claude-2");
    }

    #[tokio::test]
    async fn test_analysis_rejects_unknown_type() {
        let (state, audit) = test_state();
        let (status, body) =
            post_json(state, "/analysis", json!({ "analysisType": "forecast" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "invalid_request");
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_unknown_model_is_insufficient_data() {
        let (state, audit) = test_state();
        let (status, body) =
            post_json(state, "/analysis", json!({ "model": "no-such-model" })).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "insufficient_data");
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn test_narrative_happy_path_uses_fallback() {
        let (state, audit) = test_state();
        let (status, body) = post_json(
            state,
            "/narrative",
            json!({
                "metrics": [{
                    "model": "gpt-4o",
                    "tokensUsed": 1245800.0,
                    "cost": 24.91,
                    "requestCount": 842.0,
                    "avgResponseTime": 0.72
                }],
                "statusRecords": [{
                    "serviceName": "OpenAI API",
                    "status": "healthy",
                    "lastUpdated": "2024-05-05T10:00:00Z"
                }],
                "analysisType": "comprehensive"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["analysisType"], "comprehensive");
        assert_eq!(body["metadata"]["generationMethod"], "fallback");
        assert!(!body["content"].as_str().unwrap().is_empty());
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.events()[0].action, "ai_analysis_completed");
    }

    #[tokio::test]
    async fn test_narrative_rejects_unknown_type() {
        let (state, audit) = test_state();
        let (status, body) = post_json(
            state,
            "/narrative",
            json!({ "metrics": [], "analysisType": "bogus" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(audit.is_empty());
    }
}
