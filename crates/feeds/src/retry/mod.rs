//! Retry and backoff policy.
//!
//! A provider gets `max_retries + 1` attempts per run. Before retry number
//! `n` (starting at 1, so the original call is never delayed) the engine waits
//! [`delay`]`(n, policy)`:
//!
//! ```text
//! base = exponential ? min(base_delay_ms * 2^(n-1), max_delay_ms) : base_delay_ms
//! wait = jitter ? base ± 25% : base
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{FeedError, Result};

/// Fraction of the base delay used as the jitter half-width.
const JITTER_FACTOR: f64 = 0.25;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Retry configuration, global or per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Retries after the original attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Cap for exponential growth.
    pub max_delay_ms: u64,
    /// Double the delay on each retry.
    pub exponential: bool,
    /// Randomize each delay by ±25%.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            exponential: true,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts allowed per run.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        delay(attempt, self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exponential && self.max_delay_ms < self.base_delay_ms {
            return Err(FeedError::invalid_config(format!(
                "maxDelayMs ({}) must be >= baseDelayMs ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }
}

/// Delay before retry number `attempt`, without jitter.
pub fn base_delay_ms(attempt: u32, policy: &RetryPolicy) -> u64 {
    if !policy.exponential {
        return policy.base_delay_ms;
    }

    let exponent = attempt.max(1) - 1;
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms)
}

/// Delay before retry number `attempt` using the thread-local RNG.
pub fn delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    delay_with_rng(attempt, policy, &mut rand::thread_rng())
}

/// Delay before retry number `attempt` drawing jitter from `rng`.
pub fn delay_with_rng<R: Rng + ?Sized>(attempt: u32, policy: &RetryPolicy, rng: &mut R) -> Duration {
    let base = base_delay_ms(attempt, policy);
    if !policy.jitter || base == 0 {
        return Duration::from_millis(base);
    }

    let spread = base as f64 * JITTER_FACTOR;
    let offset = rng.gen_range(-spread..=spread);
    let jittered = (base as f64 + offset).round().max(0.0);
    Duration::from_millis(jittered as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(exponential: bool, jitter: bool) -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            exponential,
            jitter,
        }
    }

    #[test]
    fn test_exponential_doubles_until_cap() {
        let p = policy(true, false);
        assert_eq!(delay(1, &p), Duration::from_millis(100));
        assert_eq!(delay(2, &p), Duration::from_millis(200));
        assert_eq!(delay(3, &p), Duration::from_millis(400));
        assert_eq!(delay(4, &p), Duration::from_millis(800));
        assert_eq!(delay(5, &p), Duration::from_millis(1_000));
        assert_eq!(delay(60, &p), Duration::from_millis(1_000));
        assert_eq!(delay(200, &p), Duration::from_millis(1_000));
    }

    #[test]
    fn test_linear_ignores_attempt_and_cap() {
        let p = RetryPolicy {
            max_delay_ms: 50,
            ..policy(false, false)
        };
        assert_eq!(delay(1, &p), Duration::from_millis(100));
        assert_eq!(delay(7, &p), Duration::from_millis(100));
    }

    #[test]
    fn test_attempt_zero_treated_as_first_retry() {
        let p = policy(true, false);
        assert_eq!(base_delay_ms(0, &p), 100);
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let p = policy(true, true);
        for _ in 0..200 {
            let ms = delay(3, &p).as_millis() as u64;
            assert!((300..=500).contains(&ms), "jittered delay {} out of range", ms);
        }
    }

    #[test]
    fn test_total_attempts() {
        assert_eq!(RetryPolicy::no_retry().total_attempts(), 1);
        assert_eq!(policy(true, true).total_attempts(), 6);
        let p = RetryPolicy {
            max_retries: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(p.total_attempts(), u32::MAX);
    }

    #[test]
    fn test_validate_rejects_cap_below_base() {
        let p = RetryPolicy {
            base_delay_ms: 500,
            max_delay_ms: 100,
            ..RetryPolicy::default()
        };
        assert!(matches!(p.validate(), Err(FeedError::InvalidConfig(_))));
        assert!(RetryPolicy::default().validate().is_ok());
    }
}
