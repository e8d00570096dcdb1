//! Narrative synthesis
//!
//! Turns a structured analytics report (or a monitoring snapshot) into
//! human-readable prose. Two explicit branches exist: an AI-backed branch
//! that delegates to an external chat-completion capability, and a
//! templated branch that deterministically renders the same facts. The
//! branch is chosen once per call by probing the capability; a failing
//! AI call surfaces as an error and is never disguised as a fallback
//! narrative.

pub mod prompt;
pub mod snapshot;
pub mod template;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::PerformanceAnalytics;
use crate::config::NarrativeConfig;
use crate::error::{Error, Result};
use crate::series::TimeSeries;
use crate::usage::{ModelUsage, ServiceStatus};

/// The supported narrative kinds.
///
/// Each kind selects a different template/prompt over the same underlying
/// facts; the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Optimization,
    Trends,
    Alerts,
    Comprehensive,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Optimization => "optimization",
            AnalysisKind::Trends => "trends",
            AnalysisKind::Alerts => "alerts",
            AnalysisKind::Comprehensive => "comprehensive",
        }
    }

    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Optimization,
        AnalysisKind::Trends,
        AnalysisKind::Alerts,
        AnalysisKind::Comprehensive,
    ];
}

impl std::str::FromStr for AnalysisKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "optimization" => Ok(AnalysisKind::Optimization),
            "trends" => Ok(AnalysisKind::Trends),
            "alerts" => Ok(AnalysisKind::Alerts),
            "comprehensive" => Ok(AnalysisKind::Comprehensive),
            other => Err(Error::InvalidRequest(format!(
                "unsupported analysis type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the chat-completion capability
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Completion text plus usage metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutput {
    pub content: String,
    pub total_tokens: Option<u64>,
    pub model: Option<String>,
}

/// External narrative-generation capability.
///
/// The concrete clients live outside this crate; the engine only requires
/// a capability probe and a single completion call.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Whether the capability is actually usable (e.g. an API key is
    /// configured). Checked before any call is attempted.
    fn is_configured(&self) -> bool;

    /// Perform one chat completion.
    async fn complete(&self, request: ChatRequest) -> Result<ChatOutput>;
}

/// The branch a narrative was (or will be) produced by
#[derive(Clone)]
pub enum NarrativeSource {
    AiBacked(Arc<dyn ChatCompletion>),
    Templated,
}

impl std::fmt::Debug for NarrativeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NarrativeSource::AiBacked(_) => f.write_str("AiBacked"),
            NarrativeSource::Templated => f.write_str("Templated"),
        }
    }
}

impl NarrativeSource {
    /// Select the branch for one call by probing the capability.
    pub fn probe(capability: Option<&Arc<dyn ChatCompletion>>) -> Self {
        match capability {
            Some(client) if client.is_configured() => NarrativeSource::AiBacked(client.clone()),
            Some(_) => {
                debug!("narrative capability present but not configured, using templates");
                NarrativeSource::Templated
            }
            None => NarrativeSource::Templated,
        }
    }

    pub fn is_ai_backed(&self) -> bool {
        matches!(self, NarrativeSource::AiBacked(_))
    }
}

/// How a narrative was generated, surfaced in response metadata
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeGeneration {
    AiBacked { model: String, tokens_used: u64 },
    Templated,
}

/// A generated narrative plus provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub content: String,
    pub generation: NarrativeGeneration,
}

/// Renders narratives from analytics reports and monitoring snapshots
pub struct NarrativeSynthesizer {
    capability: Option<Arc<dyn ChatCompletion>>,
    config: NarrativeConfig,
}

impl NarrativeSynthesizer {
    pub fn new(capability: Option<Arc<dyn ChatCompletion>>, config: NarrativeConfig) -> Self {
        Self { capability, config }
    }

    /// Synthesizer without an external capability; every narrative comes
    /// from the templated branch.
    pub fn templated(config: NarrativeConfig) -> Self {
        Self::new(None, config)
    }

    /// Narrative for an aggregate performance report.
    pub async fn synthesize_report(
        &self,
        kind: AnalysisKind,
        analytics: &PerformanceAnalytics,
        series: &[TimeSeries],
    ) -> Result<Narrative> {
        match NarrativeSource::probe(self.capability.as_ref()) {
            NarrativeSource::AiBacked(client) => {
                let (system, user) = prompt::report_prompt(kind, analytics, series)?;
                self.run_chat(&*client, system, user).await
            }
            NarrativeSource::Templated => Ok(Narrative {
                content: template::render_report(kind, analytics, series),
                generation: NarrativeGeneration::Templated,
            }),
        }
    }

    /// Narrative for a usage/service-status snapshot.
    pub async fn synthesize_snapshot(
        &self,
        kind: AnalysisKind,
        usage: &[ModelUsage],
        status: &[ServiceStatus],
    ) -> Result<Narrative> {
        match NarrativeSource::probe(self.capability.as_ref()) {
            NarrativeSource::AiBacked(client) => {
                let (system, user) = prompt::snapshot_prompt(kind, usage, status)?;
                self.run_chat(&*client, system, user).await
            }
            NarrativeSource::Templated => Ok(Narrative {
                content: snapshot::render_snapshot(kind, usage, status),
                generation: NarrativeGeneration::Templated,
            }),
        }
    }

    /// Execute the single remote call of the AI-backed branch, bounded by
    /// the configured timeout. Any failure surfaces as
    /// [`Error::NarrativeGeneration`]; there is no silent fallback.
    async fn run_chat(
        &self,
        client: &dyn ChatCompletion,
        system: String,
        user: String,
    ) -> Result<Narrative> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            system,
            user,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let output = tokio::time::timeout(self.config.timeout, client.complete(request))
            .await
            .map_err(|_| {
                warn!(timeout = ?self.config.timeout, "narrative call timed out");
                Error::NarrativeGeneration(format!(
                    "narrative call timed out after {:?}",
                    self.config.timeout
                ))
            })?
            .map_err(|err| match err {
                Error::NarrativeGeneration(_) => err,
                other => Error::NarrativeGeneration(other.to_string()),
            })?;

        if output.content.trim().is_empty() {
            return Err(Error::NarrativeGeneration(
                "capability returned an empty completion".to_string(),
            ));
        }

        Ok(Narrative {
            generation: NarrativeGeneration::AiBacked {
                model: output.model.unwrap_or_else(|| self.config.model.clone()),
                tokens_used: output.total_tokens.unwrap_or(0),
            },
            content: output.content,
        })
    }
}
