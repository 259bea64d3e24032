use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FeedError, Result};
use crate::health::DEFAULT_AUTO_DISABLE_THRESHOLD;
use crate::ledger::DEFAULT_HISTORY_CAPACITY;
use crate::models::RunMode;
use crate::retry::RetryPolicy;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_HEALTH_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Orchestrator settings.
///
/// Deserializes from camelCase keys; every field has a default, so a partial
/// document (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Budget for a provider's whole retry sequence.
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// Run providers concurrently (default) or one at a time by priority.
    pub parallel_execution: bool,
    /// Sequential mode only: stop at the first provider that does not succeed.
    pub fail_fast: bool,
    /// Advisory threshold reported in the metadata; never enforced.
    pub min_successful_sources: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_backoff: bool,
    pub jitter: bool,
    /// Consecutive failures after which the post-run sweep disables a provider.
    pub auto_disable_threshold: u32,
    /// Timeout for the single attempt made by a health probe.
    pub health_probe_timeout_ms: u64,
    /// Outcomes kept in history per provider.
    pub history_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: retry.max_retries,
            parallel_execution: true,
            fail_fast: false,
            min_successful_sources: 1,
            base_delay_ms: retry.base_delay_ms,
            max_delay_ms: retry.max_delay_ms,
            exponential_backoff: retry.exponential,
            jitter: retry.jitter,
            auto_disable_threshold: DEFAULT_AUTO_DISABLE_THRESHOLD,
            health_probe_timeout_ms: DEFAULT_HEALTH_PROBE_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl OrchestratorConfig {
    /// The global retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            exponential: self.exponential_backoff,
            jitter: self.jitter,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }

    pub fn mode(&self) -> RunMode {
        if self.parallel_execution {
            RunMode::Parallel
        } else {
            RunMode::Sequential
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(FeedError::invalid_config("timeoutMs must be positive"));
        }
        if self.health_probe_timeout_ms == 0 {
            return Err(FeedError::invalid_config(
                "healthProbeTimeoutMs must be positive",
            ));
        }
        if self.auto_disable_threshold == 0 {
            return Err(FeedError::invalid_config(
                "autoDisableThreshold must be at least 1",
            ));
        }
        if self.history_capacity == 0 {
            return Err(FeedError::invalid_config("historyCapacity must be at least 1"));
        }
        self.retry_policy().validate()
    }
}
