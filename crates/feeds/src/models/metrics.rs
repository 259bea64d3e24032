use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative counters for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetrics {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    /// Mean latency of successful executions.
    pub average_latency_ms: f64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Process-lifetime counters for the engine. Reset only on request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorMetrics {
    pub total_runs: u64,
    pub runs_with_any_success: u64,
    pub runs_with_no_success: u64,
    pub average_run_duration_ms: f64,
    pub providers: BTreeMap<String, ProviderMetrics>,
}
