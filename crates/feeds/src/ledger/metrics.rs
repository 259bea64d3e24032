use crate::models::{ExecutionOutcome, OrchestratorMetrics, OutcomeStatus};

/// Accumulates [`OrchestratorMetrics`] over the process lifetime.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: OrchestratorMetrics,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one provider execution. Disabled outcomes are not executions.
    pub fn record_outcome(&mut self, outcome: &ExecutionOutcome) {
        if outcome.status == OutcomeStatus::Disabled {
            return;
        }

        let entry = self
            .metrics
            .providers
            .entry(outcome.provider_name.clone())
            .or_default();
        entry.executions += 1;

        if outcome.is_success() {
            entry.successes += 1;
            entry.average_latency_ms = running_mean(
                entry.average_latency_ms,
                entry.successes,
                outcome.duration_ms as f64,
            );
            entry.last_success_at = Some(outcome.timestamp);
        } else {
            entry.failures += 1;
            entry.last_failure_at = Some(outcome.timestamp);
        }
    }

    /// Count one orchestration run.
    pub fn record_run(&mut self, duration_ms: u64, any_success: bool) {
        let m = &mut self.metrics;
        m.total_runs += 1;
        if any_success {
            m.runs_with_any_success += 1;
        } else {
            m.runs_with_no_success += 1;
        }
        m.average_run_duration_ms =
            running_mean(m.average_run_duration_ms, m.total_runs, duration_ms as f64);
    }

    pub fn snapshot(&self) -> OrchestratorMetrics {
        self.metrics.clone()
    }

    pub fn reset(&mut self) {
        self.metrics = OrchestratorMetrics::default();
    }
}

/// Mean after adding `value` as the `count`-th sample.
fn running_mean(previous: f64, count: u64, value: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    previous + (value - previous) / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_provider_counters() {
        let mut collector = MetricsCollector::new();
        collector.record_outcome(&ExecutionOutcome::success("a", Value::Null, 100, 0));
        collector.record_outcome(&ExecutionOutcome::success("a", Value::Null, 300, 0));
        collector.record_outcome(&ExecutionOutcome::failure("a", "boom", 50, 2));
        collector.record_outcome(&ExecutionOutcome::disabled("b"));

        let metrics = collector.snapshot();
        let a = &metrics.providers["a"];
        assert_eq!(a.executions, 3);
        assert_eq!(a.successes, 2);
        assert_eq!(a.failures, 1);
        assert_eq!(a.average_latency_ms, 200.0);
        assert!(a.last_success_at.is_some());
        assert!(a.last_failure_at.is_some());
        assert!(!metrics.providers.contains_key("b"));
    }

    #[test]
    fn test_run_counters_and_reset() {
        let mut collector = MetricsCollector::new();
        collector.record_run(100, true);
        collector.record_run(300, false);

        let metrics = collector.snapshot();
        assert_eq!(metrics.total_runs, 2);
        assert_eq!(metrics.runs_with_any_success, 1);
        assert_eq!(metrics.runs_with_no_success, 1);
        assert_eq!(metrics.average_run_duration_ms, 200.0);
        assert_eq!(collector.snapshot(), metrics);

        collector.reset();
        assert_eq!(collector.snapshot(), OrchestratorMetrics::default());
    }
}
