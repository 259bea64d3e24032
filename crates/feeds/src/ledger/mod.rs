//! Metrics and history ledger.
//!
//! Cumulative counters plus a bounded ring buffer of past executions,
//! consumed by monitoring and by callers debugging provider behaviour.

mod history;
mod metrics;

pub use history::{HistoryLedger, DEFAULT_HISTORY_CAPACITY};
pub use metrics::MetricsCollector;

use crate::models::{ExecutionOutcome, OrchestratorMetrics};

/// History and metrics updated together after each run.
#[derive(Debug, Default)]
pub struct ExecutionLedger {
    history: HistoryLedger,
    metrics: MetricsCollector,
}

impl ExecutionLedger {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: HistoryLedger::with_capacity(history_capacity),
            metrics: MetricsCollector::new(),
        }
    }

    /// Record every outcome of one run, then the run itself.
    pub fn record_run(&mut self, outcomes: &[ExecutionOutcome], duration_ms: u64) {
        let any_success = outcomes.iter().any(ExecutionOutcome::is_success);
        for outcome in outcomes {
            self.metrics.record_outcome(outcome);
            self.history.append(outcome.clone());
        }
        self.metrics.record_run(duration_ms, any_success);
    }

    pub fn metrics(&self) -> OrchestratorMetrics {
        self.metrics.snapshot()
    }

    pub fn history(&self, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        self.history.recent(limit)
    }

    pub fn provider_history(&self, provider: &str, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        self.history.for_provider(provider, limit)
    }

    /// Clear metrics and history.
    pub fn reset(&mut self) {
        self.metrics.reset();
        self.history.clear();
    }
}
