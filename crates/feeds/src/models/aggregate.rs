use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::outcome::{ExecutionOutcome, OutcomeStatus};

/// How providers were scheduled in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Parallel,
    Sequential,
}

/// Why a provider contributed no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceError {
    pub provider: String,
    pub status: OutcomeStatus,
    pub message: String,
}

/// Run-level metadata attached to every [`AggregateResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetadata {
    pub fetched_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub mode: RunMode,
    /// Providers that succeeded, in settlement order.
    pub sources: Vec<String>,
    pub success_count: usize,
    pub failure_count: usize,
    /// One entry per failed or timed out provider.
    pub errors: Vec<SourceError>,
    /// Providers left unexecuted because a sequential fail-fast run stopped.
    pub skipped: Vec<String>,
    /// Advisory: `success_count >= min_successful_sources`.
    pub min_sources_met: bool,
}

/// The envelope returned by one orchestration run.
///
/// `success_count == 0` is a normal value meaning every source failed; it is
/// not reported as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Payload per succeeded provider, keyed by provider name.
    pub payloads: BTreeMap<String, Value>,
    pub metadata: AggregateMetadata,
}

impl AggregateResult {
    /// Result of a run that had nothing to execute.
    pub fn empty(mode: RunMode, min_successful_sources: usize) -> Self {
        Self {
            payloads: BTreeMap::new(),
            metadata: AggregateMetadata {
                fetched_at: Utc::now(),
                total_duration_ms: 0,
                mode,
                sources: Vec::new(),
                success_count: 0,
                failure_count: 0,
                errors: Vec::new(),
                skipped: Vec::new(),
                min_sources_met: min_successful_sources == 0,
            },
        }
    }

    /// Build the envelope from settled outcomes.
    ///
    /// Disabled outcomes count as neither success nor failure.
    pub fn from_outcomes(
        outcomes: &[ExecutionOutcome],
        skipped: Vec<String>,
        mode: RunMode,
        fetched_at: DateTime<Utc>,
        total_duration_ms: u64,
        min_successful_sources: usize,
    ) -> Self {
        let mut payloads = BTreeMap::new();
        let mut sources = Vec::new();
        let mut errors = Vec::new();

        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Success => {
                    let payload = outcome.payload.clone().unwrap_or(Value::Null);
                    payloads.insert(outcome.provider_name.clone(), payload);
                    sources.push(outcome.provider_name.clone());
                }
                status if status.is_failure() => {
                    errors.push(SourceError {
                        provider: outcome.provider_name.clone(),
                        status,
                        message: outcome.error.clone().unwrap_or_default(),
                    });
                }
                _ => {}
            }
        }

        let success_count = sources.len();
        Self {
            payloads,
            metadata: AggregateMetadata {
                fetched_at,
                total_duration_ms,
                mode,
                success_count,
                failure_count: errors.len(),
                sources,
                errors,
                skipped,
                min_sources_met: success_count >= min_successful_sources,
            },
        }
    }

    pub fn payload(&self, provider: &str) -> Option<&Value> {
        self.payloads.get(provider)
    }

    pub fn has_any_success(&self) -> bool {
        self.metadata.success_count > 0
    }
}

/// Concatenate list payloads into one sequence.
///
/// Arrays are spliced in; `null` payloads are dropped; any other value is
/// appended as a single element.
pub fn flatten_payloads(payloads: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut combined = Vec::new();
    for payload in payloads {
        match payload {
            Value::Array(items) => combined.extend(items),
            Value::Null => {}
            other => combined.push(other),
        }
    }
    combined
}
