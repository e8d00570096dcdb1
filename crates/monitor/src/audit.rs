//! Audit trail sink
//!
//! Every successful analysis emits exactly one audit activity. The sink is
//! fire-and-forget from the engine's perspective: implementations absorb
//! their own failures so that a broken audit trail never fails an
//! otherwise good analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

/// One audit activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Action name, e.g. `performance_analysis_completed`
    pub action: String,
    /// Entity class the action applies to, e.g. `monitoring`
    pub entity_type: String,
    /// Human-readable description
    pub details: String,
    /// Structured context (model list, anomaly count, ...)
    pub metadata: serde_json::Value,
}

/// Append-only audit destination
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one activity. Must not fail the caller.
    async fn record(&self, event: AuditEvent);
}

/// Sink that emits audit records as structured log events
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        info!(
            action = %event.action,
            entity_type = %event.entity_type,
            details = %event.details,
            metadata = %event.metadata,
            "audit activity"
        );
    }
}

/// Sink that retains events in memory; used by tests to assert the
/// exactly-once audit property.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink lock").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("audit sink lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().expect("audit sink lock").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_sink_retains_events() {
        let sink = InMemoryAuditSink::new();
        sink.record(AuditEvent {
            action: "performance_analysis_completed".to_string(),
            entity_type: "monitoring".to_string(),
            details: "analysis of 2 models".to_string(),
            metadata: serde_json::json!({ "anomalyCount": 1 }),
        })
        .await;

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].action, "performance_analysis_completed");
    }
}
