//! Analysis API server
//!
//! Serves the monitoring engine over HTTP with the in-memory demo series
//! provider and a tracing-backed audit sink. A concrete chat-completion
//! client can be wired in where the synthesizer is constructed; without
//! one every narrative comes from the templated branch.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use monitor::{
    AnalysisHandler, AppState, MonitorConfig, NarrativeSynthesizer, SampleSeriesProvider,
    TracingAuditSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monitor=info")),
        )
        .init();

    let config = MonitorConfig::from_env();

    let provider = Arc::new(SampleSeriesProvider::with_demo_data());
    let audit: Arc<dyn monitor::AuditSink> = Arc::new(TracingAuditSink);

    let handler = Arc::new(AnalysisHandler::new(
        provider,
        audit.clone(),
        NarrativeSynthesizer::templated(config.narrative.clone()),
    ));
    let synthesizer = Arc::new(NarrativeSynthesizer::templated(config.narrative.clone()));

    let state = AppState {
        handler,
        synthesizer,
        audit,
    };

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "analysis API listening");

    axum::serve(listener, monitor::router(state))
        .await
        .context("server error")?;

    Ok(())
}
