//! Templated narrative rendering for aggregate performance reports
//!
//! The fallback branch reads the same `PerformanceAnalytics` fields and
//! series the AI branch is prompted with, so the two branches stay
//! informationally consistent. Every number quoted here is recomputed
//! from the inputs with no second code path.

use std::fmt::Write;

use super::AnalysisKind;
use crate::analysis::{Anomaly, PerformanceAnalytics};
use crate::series::TimeSeries;
use crate::usage::ModelUsage;

/// Average response time above which a model is called out as slow (seconds)
pub const SLOW_RESPONSE_THRESHOLD_SECS: f64 = 2.0;

/// Window cost above which a model is called out as expensive (USD)
pub const HIGH_COST_THRESHOLD_USD: f64 = 50.0;

/// Projected month-over-month cost growth used in trend reports
pub const COST_GROWTH_PROJECTION: f64 = 0.15;

/// Projected month-over-month token growth used in trend reports
pub const TOKEN_GROWTH_PROJECTION: f64 = 0.20;

/// Roll a model's series up into window totals
pub fn rollup(series: &TimeSeries) -> ModelUsage {
    let n = series.response_time_series.len().max(1) as f64;
    ModelUsage {
        model: series.model.clone(),
        tokens_used: series.tokens_series.iter().sum(),
        cost: series.cost_series.iter().sum(),
        request_count: series.requests_series.iter().sum(),
        avg_response_time: series.response_time_series.iter().sum::<f64>() / n,
    }
}

/// Window totals across all analyzed models
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UsageTotals {
    pub requests: f64,
    pub tokens: f64,
    pub cost: f64,
    pub avg_response_time: f64,
}

pub(crate) fn usage_totals(usage: &[ModelUsage]) -> UsageTotals {
    let models = usage.len().max(1) as f64;
    UsageTotals {
        requests: usage.iter().map(|u| u.request_count).sum(),
        tokens: usage.iter().map(|u| u.tokens_used).sum(),
        cost: usage.iter().map(|u| u.cost).sum(),
        avg_response_time: usage.iter().map(|u| u.avg_response_time).sum::<f64>() / models,
    }
}

/// Integer formatting with thousands separators ("1,245,800")
pub(crate) fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

pub(crate) fn format_usd(value: f64) -> String {
    format!("${value:.2}")
}

pub(crate) fn top_by_cost(usage: &[ModelUsage], n: usize) -> Vec<&ModelUsage> {
    let mut sorted: Vec<&ModelUsage> = usage.iter().collect();
    sorted.sort_by(|a, b| b.cost.total_cmp(&a.cost));
    sorted.truncate(n);
    sorted
}

pub(crate) fn top_by_requests(usage: &[ModelUsage], n: usize) -> Vec<&ModelUsage> {
    let mut sorted: Vec<&ModelUsage> = usage.iter().collect();
    sorted.sort_by(|a, b| b.request_count.total_cmp(&a.request_count));
    sorted.truncate(n);
    sorted
}

fn push_overall_metrics(out: &mut String, totals: &UsageTotals) {
    let _ = writeln!(out, "- Total requests: {}", format_count(totals.requests));
    let _ = writeln!(out, "- Tokens used: {}", format_count(totals.tokens));
    let _ = writeln!(out, "- Total cost: {}", format_usd(totals.cost));
    let _ = writeln!(
        out,
        "- Average response time: {:.2} s",
        totals.avg_response_time
    );
}

fn push_primary_averages(out: &mut String, analytics: &PerformanceAnalytics) {
    let a = &analytics.averages;
    let _ = writeln!(out, "- Tokens per request: {:.1}", a.tokens_per_request);
    let _ = writeln!(out, "- Cost per request: {}", format_usd(a.cost_per_request));
    let _ = writeln!(out, "- Response time: {:.2} s", a.response_time);
}

fn push_trend_directions(out: &mut String, analytics: &PerformanceAnalytics) {
    let t = &analytics.trends;
    let _ = writeln!(out, "- Cost: {}", t.cost_trend);
    let _ = writeln!(out, "- Usage: {}", t.usage_trend);
    let _ = writeln!(out, "- Response time: {}", t.response_time_trend);
}

fn push_anomaly_list(out: &mut String, anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        let _ = writeln!(out, "No statistical anomalies detected.");
        return;
    }
    for anomaly in anomalies {
        let _ = writeln!(
            out,
            "- {} at {}: {:.2} outside expected range {:.2}..{:.2} ({} severity)",
            anomaly.metric,
            anomaly.timestamp,
            anomaly.value,
            anomaly.expected_range[0],
            anomaly.expected_range[1],
            anomaly.severity.as_str()
        );
    }
}

/// Render the fallback narrative for an aggregate report
pub fn render_report(
    kind: AnalysisKind,
    analytics: &PerformanceAnalytics,
    series: &[TimeSeries],
) -> String {
    let rollups: Vec<ModelUsage> = series.iter().map(rollup).collect();
    let totals = usage_totals(&rollups);

    match kind {
        AnalysisKind::Optimization => render_optimization(analytics, &rollups, &totals),
        AnalysisKind::Trends => render_trends(analytics, &rollups, &totals),
        AnalysisKind::Alerts => render_alerts(analytics, &rollups),
        AnalysisKind::Comprehensive => render_comprehensive(analytics, &rollups, &totals),
    }
}

fn render_optimization(
    analytics: &PerformanceAnalytics,
    rollups: &[ModelUsage],
    totals: &UsageTotals,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## LLM Usage Optimization Analysis\n");

    let _ = writeln!(out, "### Overall usage");
    push_overall_metrics(&mut out, totals);

    let _ = writeln!(out, "\n### Primary model averages");
    push_primary_averages(&mut out, analytics);

    let _ = writeln!(out, "\n### Highest-cost models");
    for usage in top_by_cost(rollups, 3) {
        let _ = writeln!(
            out,
            "- **{}**: {} ({} tokens)",
            usage.model,
            format_usd(usage.cost),
            format_count(usage.tokens_used)
        );
    }

    let _ = writeln!(out, "\n### Optimization recommendations");
    let _ = writeln!(
        out,
        "1. **Cost**: consider routing simple tasks to smaller models"
    );
    let _ = writeln!(
        out,
        "2. **Tokens**: shorten prompts and tighten request structure"
    );
    let _ = writeln!(out, "3. **Caching**: cache frequently repeated requests");
    out
}

fn render_trends(
    analytics: &PerformanceAnalytics,
    rollups: &[ModelUsage],
    totals: &UsageTotals,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## LLM Usage Trend Analysis\n");

    let _ = writeln!(out, "### Current usage");
    push_overall_metrics(&mut out, totals);

    let _ = writeln!(out, "\n### Trend directions");
    push_trend_directions(&mut out, analytics);

    let _ = writeln!(out, "\n### Projected usage");
    let _ = writeln!(
        out,
        "- Expected cost next month at the current pace: {} (+{:.0}%)",
        format_usd(totals.cost * (1.0 + COST_GROWTH_PROJECTION)),
        COST_GROWTH_PROJECTION * 100.0
    );
    let _ = writeln!(
        out,
        "- Projected token usage: {} (+{:.0}%)",
        format_count(totals.tokens * (1.0 + TOKEN_GROWTH_PROJECTION)),
        TOKEN_GROWTH_PROJECTION * 100.0
    );

    let _ = writeln!(out, "\n### Most requested models");
    for usage in top_by_requests(rollups, 3) {
        let share = if totals.requests > 0.0 {
            usage.request_count / totals.requests * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "- **{}**: {} requests ({share:.1}% of total)",
            usage.model,
            format_count(usage.request_count)
        );
    }
    out
}

fn render_alerts(analytics: &PerformanceAnalytics, rollups: &[ModelUsage]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Problem Areas and Alerts\n");

    let _ = writeln!(out, "### Statistical anomalies");
    push_anomaly_list(&mut out, &analytics.anomalies);

    let slow: Vec<&ModelUsage> = rollups
        .iter()
        .filter(|u| u.avg_response_time > SLOW_RESPONSE_THRESHOLD_SECS)
        .collect();
    let _ = writeln!(out, "\n### Performance concerns");
    if slow.is_empty() {
        let _ = writeln!(out, "All models respond within normal time.");
    } else {
        for usage in &slow {
            let _ = writeln!(
                out,
                "- **{}**: high response time ({:.2} s)",
                usage.model, usage.avg_response_time
            );
        }
    }

    let expensive: Vec<&ModelUsage> = rollups
        .iter()
        .filter(|u| u.cost > HIGH_COST_THRESHOLD_USD)
        .collect();
    let _ = writeln!(out, "\n### Cost concerns");
    if expensive.is_empty() {
        let _ = writeln!(out, "No models with excessive cost.");
    } else {
        for usage in &expensive {
            let _ = writeln!(
                out,
                "- **{}**: high cost ({})",
                usage.model,
                format_usd(usage.cost)
            );
        }
    }

    let _ = writeln!(out, "\n### Recommendations");
    let _ = writeln!(
        out,
        "1. {}",
        if analytics.anomalies.is_empty() {
            "Keep monitoring for early detection of issues"
        } else {
            "Investigate the flagged anomalies before they escalate"
        }
    );
    let _ = writeln!(
        out,
        "2. {}",
        if slow.is_empty() {
            "Maintain the current request optimization"
        } else {
            "Optimize requests against the slow models"
        }
    );
    let _ = writeln!(
        out,
        "3. {}",
        if expensive.is_empty() {
            "Keep cost within the current envelope"
        } else {
            "Consider quotas for the expensive models"
        }
    );
    out
}

fn render_comprehensive(
    analytics: &PerformanceAnalytics,
    rollups: &[ModelUsage],
    totals: &UsageTotals,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Comprehensive LLM Usage Analysis\n");

    let _ = writeln!(out, "### Overview");
    push_overall_metrics(&mut out, totals);
    let _ = writeln!(out, "- Models analyzed: {}", rollups.len());
    let _ = writeln!(out, "- Anomalies detected: {}", analytics.anomalies.len());

    let _ = writeln!(out, "\n### Primary model averages");
    push_primary_averages(&mut out, analytics);

    let _ = writeln!(out, "\n### Trend directions");
    push_trend_directions(&mut out, analytics);

    let _ = writeln!(out, "\n### Statistical anomalies");
    push_anomaly_list(&mut out, &analytics.anomalies);

    let _ = writeln!(out, "\n### Key recommendations");
    let _ = writeln!(out, "1. **Optimization**: cache and tighten prompts");
    let _ = writeln!(
        out,
        "2. **Scaling**: prepare infrastructure for projected growth"
    );
    let _ = writeln!(out, "3. **Monitoring**: watch the flagged metrics closely");
    let _ = writeln!(out, "4. **Budgeting**: revisit the budget as usage grows");
    out
}
