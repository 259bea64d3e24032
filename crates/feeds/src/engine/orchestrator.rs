//! The orchestrator: runs enabled providers and keeps the books.
//!
//! A run resolves the enabled providers once, executes them (concurrently or
//! in priority order), then applies post-run bookkeeping in a fixed order:
//!
//! 1. Build the [`AggregateResult`]
//! 2. Append every outcome to metrics and history
//! 3. Feed every outcome to the health tracker, one at a time
//! 4. Auto-disable sweep, then auto-enable sweep
//!
//! Provider failures never surface as errors; they are reported in the
//! aggregate metadata. Only configuration problems produce [`FeedError`].

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;

use super::config::OrchestratorConfig;
use super::executor::execute_provider;
use crate::errors::{FeedError, Result};
use crate::health::{HealthPolicy, HealthTracker};
use crate::ledger::ExecutionLedger;
use crate::models::{
    flatten_payloads, AggregateResult, Capability, ExecutionOutcome, HealthRecord,
    OrchestratorMetrics, OverallHealth, RunMode,
};
use crate::provider::ProviderConfig;
use crate::registry::{RegistryStats, SourceRegistry};
use crate::retry::RetryPolicy;

/// Coordinates registry, health tracker and ledger.
///
/// Share it behind an `Arc` to run fetches from several tasks. Registry and
/// ledger each sit behind one mutex that is never held across an await.
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Mutex<SourceRegistry>,
    tracker: HealthTracker,
    ledger: Mutex<ExecutionLedger>,
}

impl Orchestrator {
    /// Create an orchestrator with the default health thresholds.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        Self::with_health_policy(config, HealthPolicy::default())
    }

    pub fn with_health_policy(config: OrchestratorConfig, policy: HealthPolicy) -> Result<Self> {
        config.validate()?;
        let ledger = ExecutionLedger::new(config.history_capacity);
        Ok(Self {
            config,
            registry: Mutex::new(SourceRegistry::new()),
            tracker: HealthTracker::with_policy(policy),
            ledger: Mutex::new(ledger),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn lock_registry(&self) -> MutexGuard<'_, SourceRegistry> {
        self.registry.lock().unwrap_or_else(|poisoned| {
            warn!("Source registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_ledger(&self) -> MutexGuard<'_, ExecutionLedger> {
        self.ledger.lock().unwrap_or_else(|poisoned| {
            warn!("Execution ledger mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ===== Administration =====

    /// Insert or overwrite a provider.
    pub fn register(&self, provider: ProviderConfig) -> Result<()> {
        self.lock_registry().register(provider)
    }

    /// Remove a provider and its health record. Returns false if unknown.
    pub fn unregister(&self, name: &str) -> bool {
        self.lock_registry().unregister(name)
    }

    pub fn enable(&self, name: &str) -> bool {
        self.lock_registry().enable(name)
    }

    pub fn disable(&self, name: &str) -> bool {
        self.lock_registry().disable(name)
    }

    pub fn set_priority(&self, name: &str, priority: i32) -> bool {
        self.lock_registry().set_priority(name, priority)
    }

    /// Like [`enable`](Self::enable), but reports unknown providers as an error.
    pub fn try_enable(&self, name: &str) -> Result<()> {
        if self.enable(name) {
            Ok(())
        } else {
            Err(FeedError::UnknownProvider(name.to_string()))
        }
    }

    pub fn provider(&self, name: &str) -> Option<ProviderConfig> {
        self.lock_registry().get(name)
    }

    /// Every provider, by ascending priority.
    pub fn providers(&self) -> Vec<ProviderConfig> {
        self.lock_registry().list_all()
    }

    pub fn enabled_providers(&self) -> Vec<ProviderConfig> {
        self.lock_registry().list_enabled()
    }

    pub fn providers_for(&self, capability: Capability) -> Vec<ProviderConfig> {
        self.lock_registry().by_capability(capability)
    }

    pub fn stats(&self) -> RegistryStats {
        self.lock_registry().stats()
    }

    // ===== Health =====

    pub fn health(&self, name: &str) -> Option<HealthRecord> {
        self.lock_registry().health(name)
    }

    /// Health records in priority order.
    pub fn health_records(&self) -> Vec<HealthRecord> {
        self.lock_registry().health_records()
    }

    pub fn overall_health(&self) -> OverallHealth {
        self.tracker.overall_health(&self.lock_registry())
    }

    // ===== Ledger =====

    /// Snapshot of the cumulative counters.
    pub fn metrics(&self) -> OrchestratorMetrics {
        self.lock_ledger().metrics()
    }

    /// Past outcomes, most recent first.
    pub fn history(&self, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        self.lock_ledger().history(limit)
    }

    pub fn provider_history(&self, provider: &str, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        self.lock_ledger().provider_history(provider, limit)
    }

    /// Clear metrics and history. Health records are kept.
    pub fn reset_metrics(&self) {
        self.lock_ledger().reset();
        info!("Orchestrator metrics and history reset");
    }

    // ===== Execution =====

    /// Run every enabled provider and aggregate what they return.
    pub async fn fetch_all(&self) -> AggregateResult {
        let providers = self.enabled_providers();
        self.run(providers).await
    }

    /// Run the enabled providers that supply `capability` and concatenate
    /// their payloads in priority order.
    ///
    /// List payloads are spliced into the result; `null` payloads are dropped.
    pub async fn fetch_subset(&self, capability: Capability) -> Vec<Value> {
        let providers: Vec<ProviderConfig> = self
            .enabled_providers()
            .into_iter()
            .filter(|p| p.supports(capability))
            .collect();
        let order: Vec<String> = providers.iter().map(|p| p.name.clone()).collect();

        let mut result = self.run(providers).await;
        flatten_payloads(
            order
                .iter()
                .filter_map(|name| result.payloads.remove(name)),
        )
    }

    /// Probe every registered provider once, enabled or not.
    ///
    /// Probes bypass retries and use the short probe timeout. Outcomes update
    /// health only; metrics and history are untouched.
    pub async fn check_health(&self) -> Vec<HealthRecord> {
        let providers = self.providers();
        let timeout = self.config.health_probe_timeout();
        let no_retry = RetryPolicy::no_retry();

        debug!("Probing {} providers", providers.len());
        let probes = providers
            .iter()
            .map(|p| execute_provider(&p.name, p.fetch.clone(), timeout, &no_retry));
        let outcomes = join_all(probes).await;

        let mut registry = self.lock_registry();
        for outcome in &outcomes {
            self.tracker.record(&mut registry, outcome);
        }
        registry.health_records()
    }

    async fn run(&self, providers: Vec<ProviderConfig>) -> AggregateResult {
        let mode = self.config.mode();
        let min_sources = self.config.min_successful_sources;

        if providers.is_empty() {
            debug!("No enabled providers; skipping run");
            // Sweeps still run so that recovered providers can come back
            self.apply_health(&[]);
            return AggregateResult::empty(mode, min_sources);
        }

        let fetched_at = Utc::now();
        let started = Instant::now();

        let (outcomes, skipped) = match mode {
            RunMode::Parallel => (self.run_parallel(&providers).await, Vec::new()),
            RunMode::Sequential => self.run_sequential(&providers).await,
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = AggregateResult::from_outcomes(
            &outcomes,
            skipped,
            mode,
            fetched_at,
            duration_ms,
            min_sources,
        );

        self.lock_ledger().record_run(&outcomes, duration_ms);
        self.apply_health(&outcomes);

        let meta = &result.metadata;
        info!(
            "Fetch run finished in {}ms: {} succeeded, {} failed, {} skipped",
            duration_ms,
            meta.success_count,
            meta.failure_count,
            meta.skipped.len()
        );
        if !result.has_any_success() {
            warn!("No source succeeded in this run");
        } else if !meta.min_sources_met {
            warn!(
                "Only {} of the {} sources required succeeded",
                meta.success_count, min_sources
            );
        }

        result
    }

    async fn run_parallel(&self, providers: &[ProviderConfig]) -> Vec<ExecutionOutcome> {
        let mut pending: FuturesUnordered<_> = providers.iter().map(|p| self.execute(p)).collect();

        // Settlement order
        let mut outcomes = Vec::with_capacity(providers.len());
        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run_sequential(
        &self,
        providers: &[ProviderConfig],
    ) -> (Vec<ExecutionOutcome>, Vec<String>) {
        let mut outcomes = Vec::with_capacity(providers.len());

        for (index, provider) in providers.iter().enumerate() {
            let outcome = self.execute(provider).await;
            // Any non-success stops, including a provider disabled mid-run
            let stop = self.config.fail_fast && !outcome.is_success();
            outcomes.push(outcome);

            if stop {
                let skipped: Vec<String> = providers[index + 1..]
                    .iter()
                    .map(|p| p.name.clone())
                    .collect();
                if !skipped.is_empty() {
                    info!(
                        "Fail-fast after '{}'; skipping {}",
                        provider.name,
                        skipped.join(", ")
                    );
                }
                return (outcomes, skipped);
            }
        }

        (outcomes, Vec::new())
    }

    async fn execute(&self, provider: &ProviderConfig) -> ExecutionOutcome {
        // Enabled flag is re-read here; it may have changed since resolution
        if !self.is_enabled(&provider.name) {
            debug!("{}", FeedError::ProviderDisabled(provider.name.clone()));
            return ExecutionOutcome::disabled(&provider.name);
        }

        let timeout: Duration = provider
            .timeout_override
            .unwrap_or_else(|| self.config.timeout());
        let retry = provider
            .retry_override
            .clone()
            .unwrap_or_else(|| self.config.retry_policy());

        execute_provider(&provider.name, provider.fetch.clone(), timeout, &retry).await
    }

    fn is_enabled(&self, name: &str) -> bool {
        self.lock_registry().is_enabled(name).unwrap_or(false)
    }

    fn apply_health(&self, outcomes: &[ExecutionOutcome]) {
        let mut registry = self.lock_registry();
        for outcome in outcomes {
            self.tracker.record(&mut registry, outcome);
        }

        let disabled = self
            .tracker
            .auto_disable(&mut registry, self.config.auto_disable_threshold);
        let enabled = self.tracker.auto_enable(&mut registry);
        if !disabled.is_empty() || !enabled.is_empty() {
            debug!(
                "Post-run sweep disabled {:?}, enabled {:?}",
                disabled, enabled
            );
        }
    }
}
