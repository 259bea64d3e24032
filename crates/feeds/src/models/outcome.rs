use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal state of one provider's attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
    TimedOut,
    /// The provider was not enabled when its turn came. No attempt was made.
    Disabled,
}

impl OutcomeStatus {
    /// Failure or timeout. Disabled is a skip, not a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeStatus::Failure | OutcomeStatus::TimedOut)
    }
}

/// Result of running one provider in one orchestration run.
///
/// `payload` is present iff the status is `Success`; `error` is present iff
/// the status is `Failure` or `TimedOut`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub provider_name: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub retries_used: u32,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionOutcome {
    pub fn success(
        provider_name: impl Into<String>,
        payload: Value,
        duration_ms: u64,
        retries_used: u32,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            status: OutcomeStatus::Success,
            payload: Some(payload),
            error: None,
            duration_ms,
            retries_used,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        provider_name: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
        retries_used: u32,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            status: OutcomeStatus::Failure,
            payload: None,
            error: Some(error.into()),
            duration_ms,
            retries_used,
            timestamp: Utc::now(),
        }
    }

    pub fn timed_out(
        provider_name: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
        retries_used: u32,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            status: OutcomeStatus::TimedOut,
            payload: None,
            error: Some(error.into()),
            duration_ms,
            retries_used,
            timestamp: Utc::now(),
        }
    }

    pub fn disabled(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            status: OutcomeStatus::Disabled,
            payload: None,
            error: None,
            duration_ms: 0,
            retries_used: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors_keep_payload_error_exclusive() {
        let ok = ExecutionOutcome::success("baseline", json!({"ak47": 35}), 120, 1);
        assert!(ok.is_success());
        assert!(ok.payload.is_some() && ok.error.is_none());

        let failed = ExecutionOutcome::failure("meta", "HTTP 500", 40, 3);
        assert_eq!(failed.status, OutcomeStatus::Failure);
        assert!(failed.payload.is_none() && failed.error.is_some());

        let timed_out = ExecutionOutcome::timed_out("ballistics", "timed out", 500, 0);
        assert!(timed_out.status.is_failure());

        let skipped = ExecutionOutcome::disabled("legacy");
        assert!(!skipped.status.is_failure());
        assert!(skipped.payload.is_none() && skipped.error.is_none());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent_fields() {
        let outcome = ExecutionOutcome::failure("meta", "boom", 10, 2);
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["providerName"], "meta");
        assert_eq!(value["status"], "failure");
        assert_eq!(value["retriesUsed"], 2);
        assert!(value.get("payload").is_none());
    }
}
