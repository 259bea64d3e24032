//! Error types for the feeds crate.
//!
//! This module provides:
//! - [`FeedError`]: the error enum for provider executions and configuration
//! - [`FetchError`]: the error a single fetch attempt returns
//!
//! Provider-level errors never escape a run. They are captured in the
//! [`ExecutionOutcome`](crate::ExecutionOutcome) of the provider and surfaced
//! through the aggregate metadata. Only a malformed configuration is returned
//! to the caller as an `Err`.

use thiserror::Error;

/// Result alias for fallible engine operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Errors that can occur while orchestrating feeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The whole attempt sequence for a provider exceeded its allotted time.
    #[error("Provider timed out: {provider} after {timeout_ms}ms")]
    ProviderTimeout {
        /// The provider that timed out
        provider: String,
        /// The timeout that elapsed
        timeout_ms: u64,
    },

    /// The provider's fetch failed on its final attempt.
    #[error("Provider failed: {provider} - {message}")]
    ProviderFailure {
        /// The provider that failed
        provider: String,
        /// The error message of the last attempt
        message: String,
    },

    /// The provider was skipped because it is disabled.
    /// Not an error condition; reported for completeness.
    #[error("Provider disabled: {0}")]
    ProviderDisabled(String),

    /// An administrative call referenced a provider that is not registered.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// A provider was described without a fetch operation.
    #[error("Provider '{0}' has no fetch operation")]
    MissingFetch(String),

    /// An orchestrator or provider setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeedError {
    /// Creates a ProviderFailure error.
    pub fn failure(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderFailure {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Error returned by a single fetch attempt.
///
/// Fetchers are opaque to the engine, so this carries only a message.
/// Any error type implementing `Display` converts through [`FetchError::new`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    /// Creates a fetch error from anything displayable.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = FeedError::ProviderTimeout {
            provider: "ballistics".to_string(),
            timeout_ms: 500,
        };
        assert_eq!(
            format!("{}", error),
            "Provider timed out: ballistics after 500ms"
        );

        let error = FeedError::failure("meta", "HTTP 503");
        assert_eq!(format!("{}", error), "Provider failed: meta - HTTP 503");

        let error = FeedError::MissingFetch("baseline".to_string());
        assert_eq!(
            format!("{}", error),
            "Provider 'baseline' has no fetch operation"
        );
    }

    #[test]
    fn test_fetch_error_conversions() {
        let err: FetchError = "connection reset".into();
        assert_eq!(err.message(), "connection reset");

        let err = FetchError::new(502u16);
        assert_eq!(err.to_string(), "502");

        let err = FetchError::from(format!("status {}", 502));
        assert_eq!(err.to_string(), "status 502");
    }
}
