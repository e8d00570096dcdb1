//! Prompt construction for the AI-backed narrative branch
//!
//! Each analysis kind gets a role-scoped system prompt and a user prompt
//! embedding the serialized metrics. Prompt text and call shape follow the
//! dashboard's monitoring analysis prompts.

use serde_json::json;

use super::template::rollup;
use super::AnalysisKind;
use crate::analysis::PerformanceAnalytics;
use crate::error::{Error, Result};
use crate::series::TimeSeries;
use crate::usage::{ModelUsage, ServiceStatus};

const SYSTEM_PREAMBLE: &str =
    "You are an expert in analyzing the performance and usage of LLM models. ";

const SYSTEM_POSTAMBLE: &str = " Structure the response as markdown with sections and \
     subheadings. Be specific and include numeric data where possible.";

fn system_focus(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Optimization => {
            "Provide a detailed optimization analysis of LLM model usage, focused on \
             reducing cost and improving efficiency."
        }
        AnalysisKind::Trends => {
            "Provide an analysis of LLM usage trends with projections of future usage \
             and scaling recommendations."
        }
        AnalysisKind::Alerts => {
            "Analyze the LLM monitoring data and identify any problems, warnings or \
             potential bottlenecks in the services."
        }
        AnalysisKind::Comprehensive => {
            "Provide a comprehensive analysis of every aspect of LLM model usage, \
             including optimization, trends and problems."
        }
    }
}

fn user_focus(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Optimization => {
            "Analyze the following LLM monitoring data and provide recommendations for \
             optimizing cost and performance. Pay particular attention to models with \
             high cost and slow response times."
        }
        AnalysisKind::Trends => {
            "Analyze the following LLM monitoring data and identify the current usage \
             trends. Project future usage and cost, and provide scaling recommendations."
        }
        AnalysisKind::Alerts => {
            "Analyze the following LLM monitoring data and identify all problems, \
             warnings and potential bottlenecks. Focus on unhealthy services, high \
             costs and performance issues."
        }
        AnalysisKind::Comprehensive => {
            "Analyze the following LLM monitoring data and provide a comprehensive \
             review covering cost optimization, usage trends, problems and \
             recommendations."
        }
    }
}

/// Prompt pair for an aggregate performance report
pub fn report_prompt(
    kind: AnalysisKind,
    analytics: &PerformanceAnalytics,
    series: &[TimeSeries],
) -> Result<(String, String)> {
    let rollups: Vec<ModelUsage> = series.iter().map(rollup).collect();
    let data = serde_json::to_string(&json!({
        "performanceAnalytics": analytics,
        "models": rollups,
    }))
    .map_err(|err| Error::NarrativeGeneration(format!("metrics serialization failed: {err}")))?;

    let system = format!("{SYSTEM_PREAMBLE}{}{SYSTEM_POSTAMBLE}", system_focus(kind));
    let user = format!("{} Monitoring data: {data}", user_focus(kind));
    Ok((system, user))
}

/// Prompt pair for a usage/service-status snapshot
pub fn snapshot_prompt(
    kind: AnalysisKind,
    usage: &[ModelUsage],
    status: &[ServiceStatus],
) -> Result<(String, String)> {
    let data = serde_json::to_string(&json!({
        "llmModels": usage,
        "services": status,
    }))
    .map_err(|err| Error::NarrativeGeneration(format!("metrics serialization failed: {err}")))?;

    let system = format!("{SYSTEM_PREAMBLE}{}{SYSTEM_POSTAMBLE}", system_focus(kind));
    let user = format!("{} Monitoring data: {data}", user_focus(kind));
    Ok((system, user))
}
