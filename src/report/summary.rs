//! Structured statistics over a set of outcomes.
//!
//! Meant for the calling assistant, not for display.

use crate::models::{BackendOutcome, BackendTarget};
use serde::{Deserialize, Serialize};

/// Whether a target answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Success,
    Error,
}

/// Per-target line of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub model: BackendTarget,
    pub status: TargetStatus,
    pub latency_ms: Option<u64>,
    /// Characters in the response; 0 for errors and missing responses
    pub response_length: usize,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Aggregate view over one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean of recorded latencies, rounded; null when none were recorded
    pub avg_latency_ms: Option<u64>,
    /// Missing counts add nothing
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub models: Vec<TargetSummary>,
}

/// Summarize outcomes, keeping input order in the per-target list.
pub fn build_summary(outcomes: &[BackendOutcome]) -> AggregateSummary {
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();

    let latencies: Vec<u64> = outcomes.iter().filter_map(|o| o.latency_ms).collect();
    let avg_latency_ms = (!latencies.is_empty()).then(|| {
        let sum: u128 = latencies.iter().map(|&l| u128::from(l)).sum();
        (sum as f64 / latencies.len() as f64).round() as u64
    });

    let total_prompt_tokens = outcomes
        .iter()
        .filter_map(|o| o.usage.prompt_tokens)
        .map(u64::from)
        .sum();
    let total_completion_tokens = outcomes
        .iter()
        .filter_map(|o| o.usage.completion_tokens)
        .map(u64::from)
        .sum();

    let models = outcomes
        .iter()
        .map(|o| TargetSummary {
            model: o.target.clone(),
            status: if o.is_success() {
                TargetStatus::Success
            } else {
                TargetStatus::Error
            },
            latency_ms: o.latency_ms,
            response_length: o.response().map_or(0, |r| r.chars().count()),
            prompt_tokens: o.usage.prompt_tokens,
            completion_tokens: o.usage.completion_tokens,
        })
        .collect();

    AggregateSummary {
        total: outcomes.len(),
        succeeded: outcomes.len() - failed,
        failed,
        avg_latency_ms,
        total_prompt_tokens,
        total_completion_tokens,
        models,
    }
}
