use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{FeedError, Result};
use crate::models::{Capability, UpdateFrequency};
use crate::retry::RetryPolicy;

use super::traits::SourceFetcher;

/// Default priority for providers that don't set one.
pub const DEFAULT_PRIORITY: i32 = 10;

/// A registered data source.
///
/// Owned by the [`SourceRegistry`](crate::SourceRegistry); listing calls hand
/// out clones (the fetcher is shared behind an `Arc`).
#[derive(Clone)]
pub struct ProviderConfig {
    /// Unique identifier within a registry.
    pub name: String,
    /// Lower values run first. Ties keep registration order.
    pub priority: i32,
    pub capabilities: BTreeSet<Capability>,
    pub update_frequency: UpdateFrequency,
    /// Static score in `[0.0, 1.0]`, used for reporting only.
    pub reliability: f64,
    pub enabled: bool,
    pub fetch: Arc<dyn SourceFetcher>,
    /// Replaces the global timeout for this provider.
    pub timeout_override: Option<Duration>,
    /// Replaces the global retry policy for this provider.
    pub retry_override: Option<RetryPolicy>,
}

impl ProviderConfig {
    pub fn builder(name: impl Into<String>) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(name)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Checks the invariants a provider must hold before it can be registered.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FeedError::invalid_config("provider name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.reliability) {
            return Err(FeedError::invalid_config(format!(
                "reliability of '{}' must be within [0, 1], got {}",
                self.name, self.reliability
            )));
        }
        if self.timeout_override == Some(Duration::ZERO) {
            return Err(FeedError::invalid_config(format!(
                "timeout override of '{}' must be positive",
                self.name
            )));
        }
        if let Some(retry) = &self.retry_override {
            retry.validate()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("capabilities", &self.capabilities)
            .field("update_frequency", &self.update_frequency)
            .field("reliability", &self.reliability)
            .field("enabled", &self.enabled)
            .field("timeout_override", &self.timeout_override)
            .field("retry_override", &self.retry_override)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProviderConfig`].
///
/// `build` fails with [`FeedError::MissingFetch`] when no fetch operation was
/// supplied, and with [`FeedError::InvalidConfig`] for out-of-range values.
pub struct ProviderConfigBuilder {
    name: String,
    priority: i32,
    capabilities: BTreeSet<Capability>,
    update_frequency: UpdateFrequency,
    reliability: f64,
    enabled: bool,
    fetch: Option<Arc<dyn SourceFetcher>>,
    timeout_override: Option<Duration>,
    retry_override: Option<RetryPolicy>,
}

impl ProviderConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            capabilities: BTreeSet::new(),
            update_frequency: UpdateFrequency::default(),
            reliability: 1.0,
            enabled: true,
            fetch: None,
            timeout_override: None,
            retry_override: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn update_frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.update_frequency = frequency;
        self
    }

    pub fn reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn fetch(mut self, fetch: Arc<dyn SourceFetcher>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry_override = Some(retry);
        self
    }

    pub fn build(self) -> Result<ProviderConfig> {
        let fetch = self.fetch.ok_or_else(|| FeedError::MissingFetch(self.name.clone()))?;
        let config = ProviderConfig {
            name: self.name,
            priority: self.priority,
            capabilities: self.capabilities,
            update_frequency: self.update_frequency,
            reliability: self.reliability,
            enabled: self.enabled,
            fetch,
            timeout_override: self.timeout_override,
            retry_override: self.retry_override,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fetch_fn;
    use serde_json::Value;

    fn noop() -> Arc<dyn SourceFetcher> {
        fetch_fn(|_| async { Ok(Value::Null) })
    }

    #[test]
    fn test_builder_defaults() {
        let config = ProviderConfig::builder("baseline").fetch(noop()).build().unwrap();

        assert_eq!(config.name, "baseline");
        assert_eq!(config.priority, DEFAULT_PRIORITY);
        assert!(config.enabled);
        assert_eq!(config.reliability, 1.0);
        assert_eq!(config.update_frequency, UpdateFrequency::Daily);
        assert!(config.capabilities.is_empty());
        assert!(config.timeout_override.is_none());
    }

    #[test]
    fn test_missing_fetch_is_rejected() {
        let err = ProviderConfig::builder("meta").build().unwrap_err();
        assert_eq!(err, FeedError::MissingFetch("meta".to_string()));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let err = ProviderConfig::builder("meta")
            .fetch(noop())
            .reliability(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidConfig(_)));

        let err = ProviderConfig::builder("meta")
            .fetch(noop())
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidConfig(_)));

        let err = ProviderConfig::builder("  ").fetch(noop()).build().unwrap_err();
        assert!(matches!(err, FeedError::InvalidConfig(_)));
    }

    #[test]
    fn test_supports_capability() {
        let config = ProviderConfig::builder("ballistics")
            .fetch(noop())
            .capabilities([Capability::Ballistics, Capability::Attachments])
            .build()
            .unwrap();

        assert!(config.supports(Capability::Ballistics));
        assert!(!config.supports(Capability::TierRankings));
    }
}
