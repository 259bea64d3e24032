//! Runs one provider's attempt sequence under a single timeout.
//!
//! ```text
//! pending -> attempting -> success
//!               |  ^
//!           fail|  |delay(n)
//!               v  |
//!           backing off -> failure (after max_retries + 1 attempts)
//!
//! any state --timeout--> timed_out
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::errors::{FeedError, FetchError};
use crate::models::ExecutionOutcome;
use crate::provider::SourceFetcher;
use crate::retry::RetryPolicy;

/// Execute `fetch` with retries, racing the whole sequence against `timeout`.
///
/// Each attempt runs on its own task. When the timeout fires the engine stops
/// waiting and cancels the token handed to the fetcher; an attempt that
/// ignores the token runs to completion in the background.
pub(crate) async fn execute_provider(
    name: &str,
    fetch: Arc<dyn SourceFetcher>,
    timeout: Duration,
    retry: &RetryPolicy,
) -> ExecutionOutcome {
    let started = Instant::now();
    let attempts = AtomicU32::new(0);
    let cancel = CancellationToken::new();

    let sequence = run_attempts(name, fetch, retry, &attempts, &cancel);
    let result = tokio::time::timeout(timeout, sequence).await;

    let duration_ms = elapsed_ms(started);
    let retries_used = attempts.load(Ordering::SeqCst).saturating_sub(1);

    match result {
        Ok(Ok(payload)) => {
            debug!(
                "Provider '{}' succeeded in {}ms ({} retries)",
                name, duration_ms, retries_used
            );
            ExecutionOutcome::success(name, payload, duration_ms, retries_used)
        }
        Ok(Err(err)) => {
            let error = FeedError::failure(name, err.message());
            warn!("{} (after {} attempts)", error, retries_used + 1);
            ExecutionOutcome::failure(name, err.message(), duration_ms, retries_used)
        }
        Err(_) => {
            cancel.cancel();
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let error = FeedError::ProviderTimeout {
                provider: name.to_string(),
                timeout_ms,
            };
            warn!("{}", error);
            ExecutionOutcome::timed_out(
                name,
                format!("timed out after {}ms", timeout_ms),
                duration_ms,
                retries_used,
            )
        }
    }
}

async fn run_attempts(
    name: &str,
    fetch: Arc<dyn SourceFetcher>,
    retry: &RetryPolicy,
    attempts: &AtomicU32,
    cancel: &CancellationToken,
) -> Result<Value, FetchError> {
    let total = retry.total_attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        attempts.store(attempt, Ordering::SeqCst);

        match run_attempt(fetch.clone(), cancel.child_token()).await {
            Ok(payload) => return Ok(payload),
            Err(err) if attempt >= total => return Err(err),
            Err(err) => {
                let wait = retry.delay_for(attempt);
                debug!(
                    "Provider '{}' attempt {}/{} failed: {}; retrying in {:?}",
                    name, attempt, total, err, wait
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

async fn run_attempt(
    fetch: Arc<dyn SourceFetcher>,
    cancel: CancellationToken,
) -> Result<Value, FetchError> {
    let handle = tokio::spawn(async move { fetch.fetch(cancel).await });
    match handle.await {
        Ok(result) => result,
        Err(join_err) => Err(FetchError::new(format!("fetch task failed: {}", join_err))),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeStatus;
    use crate::provider::fetch_fn;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            exponential: true,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let fetch = fetch_fn(|_| async { Ok(json!({"tier": "S"})) });

        let outcome =
            execute_provider("meta", fetch, Duration::from_secs(1), &fast_retry(3)).await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.retries_used, 0);
        assert_eq!(outcome.payload, Some(json!({"tier": "S"})));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = fetch_fn(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FetchError::new("HTTP 503"))
                } else {
                    Ok(json!([]))
                }
            }
        });

        let outcome =
            execute_provider("baseline", fetch, Duration::from_secs(1), &fast_retry(3)).await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.retries_used, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = fetch_fn(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Err(FetchError::new(format!("attempt {} failed", n + 1))) }
        });

        let outcome =
            execute_provider("baseline", fetch, Duration::from_secs(1), &fast_retry(2)).await;

        assert_eq!(outcome.status, OutcomeStatus::Failure);
        assert_eq!(outcome.retries_used, 2);
        assert_eq!(outcome.error.as_deref(), Some("attempt 3 failed"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_cancels_token_and_stops_retrying() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));
        let (counter, seen) = (calls.clone(), cancelled.clone());
        let fetch = fetch_fn(move |cancel: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            let seen = seen.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Err(FetchError::new("cancelled"))
                    }
                    _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(Value::Null),
                }
            }
        });

        let outcome =
            execute_provider("ballistics", fetch, Duration::from_millis(50), &fast_retry(3)).await;

        assert_eq!(outcome.status, OutcomeStatus::TimedOut);
        assert_eq!(outcome.error.as_deref(), Some("timed out after 50ms"));
        assert!(outcome.payload.is_none());
        assert_eq!(outcome.retries_used, 0);

        // The abandoned attempt observes the cancellation on its own task
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backoff_waits_between_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = fetch_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::new("HTTP 500")) }
        });
        let retry = RetryPolicy {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            exponential: true,
            jitter: false,
        };

        let outcome = execute_provider("meta", fetch, Duration::from_secs(5), &retry).await;

        assert_eq!(outcome.status, OutcomeStatus::Failure);
        assert_eq!(outcome.retries_used, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms after the first failure, 200ms after the second
        assert!(
            outcome.duration_ms >= 300,
            "expected at least 300ms of backoff, got {}ms",
            outcome.duration_ms
        );
    }

    #[tokio::test]
    async fn test_timeout_during_backoff_ends_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = fetch_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::new("HTTP 502")) }
        });
        let retry = RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 5_000,
            exponential: true,
            jitter: false,
        };

        let outcome =
            execute_provider("meta", fetch, Duration::from_millis(300), &retry).await;

        assert_eq!(outcome.status, OutcomeStatus::TimedOut);
        assert_eq!(outcome.retries_used, 0);
        assert!(outcome.duration_ms < 1_000);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The backoff would have ended by now; no second attempt may start
        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_a_failure() {
        let fetch = fetch_fn(|_| async {
            if true {
                panic!("provider bug");
            }
            Ok(Value::Null)
        });

        let outcome =
            execute_provider("buggy", fetch, Duration::from_secs(1), &fast_retry(0)).await;

        assert_eq!(outcome.status, OutcomeStatus::Failure);
        assert!(outcome.error.unwrap().contains("fetch task failed"));
    }
}
