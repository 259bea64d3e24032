//! Health tracker: derives provider health from execution outcomes.
//!
//! The tracker owns no state of its own beyond its thresholds. Health records
//! live in the registry's side table so that registering or removing a
//! provider creates or drops its record in the same step.

use log::{debug, info, warn};

use crate::models::{ExecutionOutcome, HealthStatus, OutcomeStatus, OverallHealth};
use crate::registry::SourceRegistry;

/// Default consecutive failures before auto-disable.
pub const DEFAULT_AUTO_DISABLE_THRESHOLD: u32 = 5;

/// Consecutive plain failures at which a provider is classified `down`.
const DEFAULT_FAILURE_DOWN_AFTER: u32 = 3;

/// Consecutive failures ending in a timeout at which a provider is `down`.
const DEFAULT_TIMEOUT_DOWN_AFTER: u32 = 3;

/// Classification thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPolicy {
    /// `down` once this many consecutive failures end in a plain failure.
    pub failure_down_after: u32,
    /// `down` once this many consecutive failures end in a timeout.
    pub timeout_down_after: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_down_after: DEFAULT_FAILURE_DOWN_AFTER,
            timeout_down_after: DEFAULT_TIMEOUT_DOWN_AFTER,
        }
    }
}

/// Applies outcomes to health records and manages enabled flags.
#[derive(Debug, Clone, Default)]
pub struct HealthTracker {
    policy: HealthPolicy,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: HealthPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Update the provider's health record from one outcome.
    ///
    /// Returns false when nothing changed: the outcome was `disabled`, or the
    /// provider is no longer registered.
    pub fn record(&self, registry: &mut SourceRegistry, outcome: &ExecutionOutcome) -> bool {
        if outcome.status == OutcomeStatus::Disabled {
            return false;
        }

        let Some(state) = registry.health_state_mut(&outcome.provider_name) else {
            debug!(
                "Dropping outcome for unregistered provider '{}'",
                outcome.provider_name
            );
            return false;
        };

        let success = outcome.is_success();
        state.push(success, outcome.duration_ms);
        let uptime = state.uptime_percent();
        let latency = state.average_latency_ms();

        let record = &mut state.record;
        record.uptime_percent = uptime;

        if success {
            if record.status != HealthStatus::Healthy && record.status != HealthStatus::Unknown {
                info!(
                    "Provider '{}' recovered after {} consecutive failures",
                    record.provider_name, record.consecutive_failures
                );
            }
            record.consecutive_failures = 0;
            record.status = HealthStatus::Healthy;
            record.last_success_at = Some(outcome.timestamp);
            record.average_latency_ms = latency;
            return true;
        }

        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        record.last_failure_at = Some(outcome.timestamp);
        record.message = outcome.error.clone();

        let down_after = if outcome.status == OutcomeStatus::TimedOut {
            self.policy.timeout_down_after
        } else {
            self.policy.failure_down_after
        };
        let status = if record.consecutive_failures >= down_after {
            HealthStatus::Down
        } else {
            HealthStatus::Degraded
        };

        if status == HealthStatus::Down && record.status != HealthStatus::Down {
            warn!(
                "Provider '{}' is down after {} consecutive failures: {}",
                record.provider_name,
                record.consecutive_failures,
                record.message.as_deref().unwrap_or("unknown error")
            );
        }
        record.status = status;
        true
    }

    /// Disable every enabled provider with at least `threshold` consecutive
    /// failures. Returns the names disabled, in priority order.
    pub fn auto_disable(&self, registry: &mut SourceRegistry, threshold: u32) -> Vec<String> {
        let candidates: Vec<String> = registry
            .list_enabled()
            .into_iter()
            .filter(|p| {
                registry
                    .health(&p.name)
                    .is_some_and(|h| h.consecutive_failures >= threshold)
            })
            .map(|p| p.name)
            .collect();

        for name in &candidates {
            registry.disable(name);
            warn!(
                "Auto-disabled provider '{}' after reaching {} consecutive failures",
                name, threshold
            );
        }
        candidates
    }

    /// Re-enable every disabled provider that is healthy with no outstanding
    /// failures. Returns the names enabled, in priority order.
    pub fn auto_enable(&self, registry: &mut SourceRegistry) -> Vec<String> {
        let candidates: Vec<String> = registry
            .list_all()
            .into_iter()
            .filter(|p| !p.enabled)
            .filter(|p| {
                registry.health(&p.name).is_some_and(|h| {
                    h.status == HealthStatus::Healthy && h.consecutive_failures == 0
                })
            })
            .map(|p| p.name)
            .collect();

        for name in &candidates {
            registry.enable(name);
            info!("Auto-enabled recovered provider '{}'", name);
        }
        candidates
    }

    /// Summary over every registered provider.
    ///
    /// `down` iff every provider is down; `degraded` iff any provider is down
    /// or more than half are degraded; `unknown` with no providers or when no
    /// provider has run yet.
    pub fn overall_health(&self, registry: &SourceRegistry) -> OverallHealth {
        let mut overall = OverallHealth {
            status: HealthStatus::Unknown,
            healthy_count: 0,
            degraded_count: 0,
            down_count: 0,
            total_count: 0,
        };

        for record in registry.tracked_records() {
            overall.total_count += 1;
            match record.status {
                HealthStatus::Healthy => overall.healthy_count += 1,
                HealthStatus::Degraded => overall.degraded_count += 1,
                HealthStatus::Down => overall.down_count += 1,
                HealthStatus::Unknown => {}
            }
        }

        let observed = overall.healthy_count + overall.degraded_count + overall.down_count;
        overall.status = if observed == 0 {
            HealthStatus::Unknown
        } else if overall.down_count == overall.total_count {
            HealthStatus::Down
        } else if overall.down_count > 0 || overall.degraded_count * 2 > overall.total_count {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        overall
    }
}
