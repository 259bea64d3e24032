use std::collections::{HashMap, VecDeque};

use crate::models::ExecutionOutcome;

/// Default number of outcomes retained per provider.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Bounded per-provider history of execution outcomes.
///
/// Each provider keeps at most `capacity` entries; the oldest is evicted
/// first. Entries carry a global sequence number so that queries across
/// providers can be returned most-recent-first.
#[derive(Debug)]
pub struct HistoryLedger {
    capacity: usize,
    entries: HashMap<String, VecDeque<(u64, ExecutionOutcome)>>,
    next_seq: u64,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn append(&mut self, outcome: ExecutionOutcome) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let buffer = self
            .entries
            .entry(outcome.provider_name.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back((seq, outcome));
    }

    /// Outcomes across all providers, most recent first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        let mut all: Vec<&(u64, ExecutionOutcome)> = self.entries.values().flatten().collect();
        all.sort_by(|a, b| b.0.cmp(&a.0));

        let limit = limit.unwrap_or(all.len());
        all.into_iter()
            .take(limit)
            .map(|(_, outcome)| outcome.clone())
            .collect()
    }

    /// Outcomes for one provider, most recent first.
    pub fn for_provider(&self, provider: &str, limit: Option<usize>) -> Vec<ExecutionOutcome> {
        let Some(buffer) = self.entries.get(provider) else {
            return Vec::new();
        };
        let limit = limit.unwrap_or(buffer.len());
        buffer
            .iter()
            .rev()
            .take(limit)
            .map(|(_, outcome)| outcome.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn outcome(provider: &str, duration_ms: u64) -> ExecutionOutcome {
        ExecutionOutcome::success(provider, Value::Null, duration_ms, 0)
    }

    #[test]
    fn test_recent_is_most_recent_first_across_providers() {
        let mut ledger = HistoryLedger::new();
        ledger.append(outcome("a", 1));
        ledger.append(outcome("b", 2));
        ledger.append(outcome("a", 3));

        let durations: Vec<u64> = ledger.recent(None).iter().map(|o| o.duration_ms).collect();
        assert_eq!(durations, vec![3, 2, 1]);

        let limited = ledger.recent(Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].duration_ms, 3);
    }

    #[test]
    fn test_capacity_is_per_provider_fifo() {
        let mut ledger = HistoryLedger::with_capacity(3);
        for i in 0..5 {
            ledger.append(outcome("a", i));
        }
        ledger.append(outcome("b", 100));

        assert_eq!(ledger.len(), 4);
        let a: Vec<u64> = ledger
            .for_provider("a", None)
            .iter()
            .map(|o| o.duration_ms)
            .collect();
        assert_eq!(a, vec![4, 3, 2]);
        assert_eq!(ledger.for_provider("b", Some(10)).len(), 1);
        assert!(ledger.for_provider("missing", None).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut ledger = HistoryLedger::new();
        ledger.append(outcome("a", 1));
        assert!(!ledger.is_empty());

        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.recent(None).is_empty());
    }
}
