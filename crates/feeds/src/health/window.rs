//! Per-provider sample window backing the rolling health figures.

use std::collections::VecDeque;

use crate::models::HealthRecord;

/// Executions considered for uptime.
pub const UPTIME_WINDOW: usize = 100;

/// Successful executions considered for average latency.
pub const LATENCY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Sample {
    success: bool,
    latency_ms: u64,
}

/// Health record plus the ring buffer of recent executions it is derived from.
#[derive(Debug, Clone)]
pub(crate) struct HealthState {
    pub(crate) record: HealthRecord,
    samples: VecDeque<Sample>,
}

impl HealthState {
    pub(crate) fn new(provider_name: &str) -> Self {
        Self {
            record: HealthRecord::new(provider_name),
            samples: VecDeque::with_capacity(UPTIME_WINDOW),
        }
    }

    /// Push one execution, evicting the oldest beyond the uptime window.
    pub(crate) fn push(&mut self, success: bool, latency_ms: u64) {
        if self.samples.len() == UPTIME_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            success,
            latency_ms,
        });
    }

    /// Successes / total over the window, ×100. 100 with no history.
    pub(crate) fn uptime_percent(&self) -> f64 {
        if self.samples.is_empty() {
            return 100.0;
        }
        let successes = self.samples.iter().filter(|s| s.success).count();
        successes as f64 / self.samples.len() as f64 * 100.0
    }

    /// Mean latency of the most recent successful executions.
    pub(crate) fn average_latency_ms(&self) -> f64 {
        let (sum, count) = self
            .samples
            .iter()
            .rev()
            .filter(|s| s.success)
            .take(LATENCY_WINDOW)
            .fold((0u64, 0usize), |(sum, count), s| {
                (sum.saturating_add(s.latency_ms), count + 1)
            });

        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_defaults() {
        let state = HealthState::new("baseline");
        assert_eq!(state.uptime_percent(), 100.0);
        assert_eq!(state.average_latency_ms(), 0.0);
    }

    #[test]
    fn test_latency_uses_last_ten_successes_only() {
        let mut state = HealthState::new("baseline");
        // Old, slow successes that fall outside the latency window
        for _ in 0..5 {
            state.push(true, 1_000);
        }
        for _ in 0..10 {
            state.push(true, 100);
        }
        // Failures do not contribute latency
        state.push(false, 9_999);

        assert_eq!(state.average_latency_ms(), 100.0);
    }

    #[test]
    fn test_uptime_window_evicts_oldest() {
        let mut state = HealthState::new("meta");
        for _ in 0..UPTIME_WINDOW {
            state.push(false, 0);
        }
        assert_eq!(state.uptime_percent(), 0.0);

        for _ in 0..50 {
            state.push(true, 10);
        }
        assert_eq!(state.len(), UPTIME_WINDOW);
        assert_eq!(state.uptime_percent(), 50.0);
    }
}
