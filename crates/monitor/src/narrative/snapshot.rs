//! Templated narrative rendering for monitoring snapshots
//!
//! Point-in-time counterpart of [`super::template`]: the inputs are
//! aggregate per-model usage records and service status records rather
//! than historical series.

use std::fmt::Write;

use super::template::{
    format_count, format_usd, top_by_cost, top_by_requests, usage_totals, UsageTotals,
    HIGH_COST_THRESHOLD_USD, SLOW_RESPONSE_THRESHOLD_SECS,
};
use super::AnalysisKind;
use crate::usage::{ModelUsage, ServiceHealth, ServiceStatus};

/// Request volume beyond which scaling pressure is called high
const SCALING_REQUEST_THRESHOLD: f64 = 10_000.0;

/// Assumed share of cost recoverable through prompt/caching optimization
const POTENTIAL_SAVINGS_RATIO: f64 = 0.25;

/// Render the fallback narrative for a monitoring snapshot
pub fn render_snapshot(
    kind: AnalysisKind,
    usage: &[ModelUsage],
    status: &[ServiceStatus],
) -> String {
    let totals = usage_totals(usage);
    match kind {
        AnalysisKind::Optimization => render_optimization(usage, &totals),
        AnalysisKind::Trends => render_trends(usage, &totals),
        AnalysisKind::Alerts => render_alerts(usage, status),
        AnalysisKind::Comprehensive => render_comprehensive(usage, status, &totals),
    }
}

fn problem_services(status: &[ServiceStatus]) -> Vec<&ServiceStatus> {
    status.iter().filter(|s| !s.is_healthy()).collect()
}

fn slow_models(usage: &[ModelUsage]) -> Vec<&ModelUsage> {
    usage
        .iter()
        .filter(|u| u.avg_response_time > SLOW_RESPONSE_THRESHOLD_SECS)
        .collect()
}

fn expensive_models(usage: &[ModelUsage]) -> Vec<&ModelUsage> {
    usage
        .iter()
        .filter(|u| u.cost > HIGH_COST_THRESHOLD_USD)
        .collect()
}

fn push_usage_metrics(out: &mut String, totals: &UsageTotals) {
    let _ = writeln!(out, "- Total requests: {}", format_count(totals.requests));
    let _ = writeln!(out, "- Tokens used: {}", format_count(totals.tokens));
    let _ = writeln!(out, "- Total cost: {}", format_usd(totals.cost));
    let _ = writeln!(
        out,
        "- Average response time: {:.2} s",
        totals.avg_response_time
    );
}

fn render_optimization(usage: &[ModelUsage], totals: &UsageTotals) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## LLM Usage Optimization Analysis\n");

    let _ = writeln!(out, "### Overall usage metrics");
    push_usage_metrics(&mut out, totals);

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

    let _ = writeln!(out, "\n### Highest-cost models");
    for model in top_by_cost(usage, 3) {
        let _ = writeln!(
            out,
            "- **{}**: {} ({} tokens)",
            model.model,
            format_usd(model.cost),
            format_count(model.tokens_used)
        );
    }

    let _ = writeln!(out, "\n### Performance optimization");
    let _ = writeln!(out, "- Optimize requests against high-latency models");
    let _ = writeln!(out, "- Consider balancing load between models");
    let _ = writeln!(out, "- Increase throughput of heavily loaded services");
    out
}

fn render_trends(usage: &[ModelUsage], totals: &UsageTotals) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## LLM Usage Trend Analysis\n");

    let _ = writeln!(out, "### Current usage");
    push_usage_metrics(&mut out, totals);

    let _ = writeln!(out, "\n### Usage projection");
    let _ = writeln!(
        out,
        "- Expected cost next month at the current pace: {} (+15%)",
        format_usd(totals.cost * 1.15)
    );
    let _ = writeln!(
        out,
        "- Projected token usage: {} (+20%)",
        format_count(totals.tokens * 1.2)
    );

    let _ = writeln!(out, "\n### Scaling recommendations");
    let _ = writeln!(
        out,
        "1. **Infrastructure**: grow compute in line with projected usage"
    );
    let _ = writeln!(out, "2. **Budget**: plan for a larger LLM services budget");
    let _ = writeln!(
        out,
        "3. **Optimization**: reduce unit cost before volume grows"
    );

    let _ = writeln!(out, "\n### Most requested models");
    for model in top_by_requests(usage, 3) {
        let share = if totals.requests > 0.0 {
            model.request_count / totals.requests * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "- **{}**: {} requests ({share:.1}% of total)",
            model.model,
            format_count(model.request_count)
        );
    }
    out
}

fn render_alerts(usage: &[ModelUsage], status: &[ServiceStatus]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Problem Areas and Alerts\n");

    let problems = problem_services(status);
    let _ = writeln!(out, "### Service status");
    if problems.is_empty() {
        let _ = writeln!(out, "All services are operating normally.");
    } else {
        for service in &problems {
            let state = match service.status {
                ServiceHealth::Degraded => "degraded performance",
                ServiceHealth::Down => "service unavailable",
                ServiceHealth::Healthy => unreachable!("filtered above"),
            };
            let _ = writeln!(out, "- **{}**: {state}", service.service_name);
            let _ = writeln!(out, "  - Last updated: {}", service.last_updated);
            if let Some(details) = &service.details {
                if let Some(error) = &details.latest_error {
                    let _ = writeln!(out, "  - Error: {error}");
                }
                if let Some(queue) = details.queue_length {
                    let _ = writeln!(out, "  - Queue length: {queue} requests");
                }
            }
        }
    }

    let slow = slow_models(usage);
    let _ = writeln!(out, "\n### Performance problems");
    if slow.is_empty() {
        let _ = writeln!(out, "All models respond within normal time.");
    } else {
        for model in &slow {
            let _ = writeln!(
                out,
                "- **{}**: high response time ({:.2} s)",
                model.model, model.avg_response_time
            );
        }
    }

    let expensive = expensive_models(usage);
    let _ = writeln!(out, "\n### Potential cost problems");
    if expensive.is_empty() {
        let _ = writeln!(out, "No models with excessive cost.");
    } else {
        for model in &expensive {
            let _ = writeln!(
                out,
                "- **{}**: high cost ({})",
                model.model,
                format_usd(model.cost)
            );
        }
    }

    let _ = writeln!(out, "\n### Recommendations");
    let _ = writeln!(
        out,
        "1. {}",
        if problems.is_empty() {
            "Keep monitoring services for early detection of problems"
        } else {
            "Inspect and restart the degraded services"
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
            "Keep monitoring model spend"
        } else {
            "Consider quotas for the expensive models"
        }
    );
    out
}

fn render_comprehensive(
    usage: &[ModelUsage],
    status: &[ServiceStatus],
    totals: &UsageTotals,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Comprehensive LLM Usage Analysis\n");

    let _ = writeln!(out, "### Overview");
    push_usage_metrics(&mut out, totals);
    let _ = writeln!(out, "- Services: {}", status.len());
    let _ = writeln!(out, "- Models: {}", usage.len());

    let problems = problem_services(status);
    let _ = writeln!(out, "\n### Infrastructure status");
    if problems.is_empty() {
        let _ = writeln!(out, "All services are operating normally.");
    } else {
        let _ = writeln!(
            out,
            "{} of {} services report problems.",
            problems.len(),
            status.len()
        );
    }

    let expensive = expensive_models(usage);
    let _ = writeln!(out, "\n### Cost optimization");
    let _ = writeln!(
        out,
        "1. High-cost models detected: {}",
        if expensive.is_empty() { "no" } else { "yes" }
    );
    let _ = writeln!(out, "2. Prompt size and request structure are worth reviewing");
    let _ = writeln!(
        out,
        "3. Potential savings with optimization: up to {:.0}% ({})",
        POTENTIAL_SAVINGS_RATIO * 100.0,
        format_usd(totals.cost * POTENTIAL_SAVINGS_RATIO)
    );

    let _ = writeln!(out, "\n### Trends");
    let _ = writeln!(out, "1. Projected usage growth: 15-20% per month");
    let top: Vec<String> = top_by_requests(usage, 2)
        .iter()
        .map(|m| m.model.clone())
        .collect();
    let _ = writeln!(out, "2. Most requested models: {}", top.join(", "));
    let _ = writeln!(
        out,
        "3. Scaling pressure: {}",
        if totals.requests > SCALING_REQUEST_THRESHOLD {
            "high"
        } else {
            "moderate"
        }
    );

    let slow = slow_models(usage);
    let _ = writeln!(out, "\n### Potential problems");
    let _ = writeln!(
        out,
        "1. Performance: {}",
        if slow.is_empty() {
            "no slow models"
        } else {
            "models with high response time detected"
        }
    );
    let _ = writeln!(
        out,
        "2. Availability: {}",
        if problems.is_empty() {
            "all services available"
        } else {
            "degraded services present"
        }
    );
    let _ = writeln!(
        out,
        "3. Cost: {}",
        if expensive.is_empty() {
            "within the expected envelope"
        } else {
            "high-cost models detected"
        }
    );

    let _ = writeln!(out, "\n### Key recommendations");
    let _ = writeln!(out, "1. **Optimization**: cache and tighten prompts");
    let _ = writeln!(
        out,
        "2. **Scaling**: prepare infrastructure for projected growth"
    );
    let _ = writeln!(out, "3. **Monitoring**: watch the degraded services closely");
    let _ = writeln!(out, "4. **Budgeting**: revisit the budget as usage grows");
    out
}
