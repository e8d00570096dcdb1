//! Usage and service-status snapshot types
//!
//! The narrative boundary also accepts point-in-time monitoring snapshots
//! (aggregate usage per model plus service health), independent of the
//! historical series pipeline.

use serde::{Deserialize, Serialize};

/// Aggregate usage of one model over the reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub model: String,
    pub tokens_used: f64,
    pub cost: f64,
    pub request_count: f64,
    pub avg_response_time: f64,
}

/// Health of an upstream LLM service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Degraded,
    Down,
}

impl ServiceHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceHealth::Healthy => "healthy",
            ServiceHealth::Degraded => "degraded",
            ServiceHealth::Down => "down",
        }
    }
}

/// Optional operational detail attached to a service status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceStatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_utilization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_error: Option<String>,
}

/// Point-in-time status record for one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub service_name: String,
    pub status: ServiceHealth,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ServiceStatusDetails>,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceHealth::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_usage_wire_names() {
        let usage = ModelUsage {
            model: "gpt-4o".to_string(),
            tokens_used: 1_245_800.0,
            cost: 24.91,
            request_count: 842.0,
            avg_response_time: 0.72,
        };
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["tokensUsed"], 1_245_800.0);
        assert_eq!(json["requestCount"], 842.0);
        assert_eq!(json["avgResponseTime"], 0.72);
    }

    #[test]
    fn test_service_status_roundtrip() {
        let raw = serde_json::json!({
            "serviceName": "OpenAI API",
            "status": "degraded",
            "lastUpdated": "2024-05-05T10:00:00Z",
            "details": { "queueLength": 3, "latestError": "elevated latency" }
        });
        let status: ServiceStatus = serde_json::from_value(raw).unwrap();
        assert_eq!(status.status, ServiceHealth::Degraded);
        assert!(!status.is_healthy());
        assert_eq!(status.details.as_ref().unwrap().queue_length, Some(3));
    }
}
