use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health classification of a provider, or of the whole engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No execution recorded yet.
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling health of one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub provider_name: String,
    pub status: HealthStatus,
    /// Reset to 0 by any success.
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Mean latency over the last 10 successful executions.
    pub average_latency_ms: f64,
    /// Successes over the last 100 executions, as a percentage.
    pub uptime_percent: f64,
    /// Last error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthRecord {
    /// A freshly registered provider: unknown status, no history.
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            status: HealthStatus::Unknown,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
            average_latency_ms: 0.0,
            uptime_percent: 100.0,
            message: None,
        }
    }
}

/// Summary across every registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallHealth {
    pub status: HealthStatus,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub down_count: usize,
    pub total_count: usize,
}
