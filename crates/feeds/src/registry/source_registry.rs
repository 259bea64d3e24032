//! Source registry: the catalogue of providers and their health side table.
//!
//! The registry handles:
//! - Registration, overwrite and removal of providers
//! - Enabled flags and priorities
//! - Priority ordering (stable on registration order)
//! - Capability lookup and catalogue statistics
//!
//! It performs no I/O. The [`HealthTracker`](crate::HealthTracker) reads and
//! writes the health side table; the [`Orchestrator`](crate::Orchestrator)
//! serializes all mutation behind a single lock.

use std::collections::HashMap;

use log::{debug, info};

use super::RegistryStats;
use crate::errors::Result;
use crate::health::HealthState;
use crate::models::{Capability, HealthRecord};
use crate::provider::ProviderConfig;

/// A provider plus the order in which it was first registered.
struct RegisteredProvider {
    config: ProviderConfig,
    seq: u64,
}

/// Catalogue of providers.
#[derive(Default)]
pub struct SourceRegistry {
    providers: HashMap<String, RegisteredProvider>,
    health: HashMap<String, HealthState>,
    next_seq: u64,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a provider.
    ///
    /// Overwriting keeps the provider's original registration position and
    /// resets its health record to `unknown`.
    pub fn register(&mut self, config: ProviderConfig) -> Result<()> {
        config.validate()?;
        let name = config.name.clone();

        match self.providers.get_mut(&name) {
            Some(existing) => {
                info!("Overwriting registered provider '{}'", name);
                existing.config = config;
            }
            None => {
                debug!(
                    "Registering provider '{}' (priority {}, enabled: {})",
                    name, config.priority, config.enabled
                );
                let seq = self.next_seq;
                self.next_seq += 1;
                self.providers
                    .insert(name.clone(), RegisteredProvider { config, seq });
            }
        }

        self.health.insert(name.clone(), HealthState::new(&name));
        Ok(())
    }

    /// Remove a provider and its health record. False if not registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.health.remove(name);
        let removed = self.providers.remove(name).is_some();
        if removed {
            info!("Unregistered provider '{}'", name);
        } else {
            debug!("Unregister ignored: unknown provider '{}'", name);
        }
        removed
    }

    /// Enable a provider. Idempotent; false if not registered.
    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable a provider. Idempotent; false if not registered.
    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.providers.get_mut(name) {
            Some(entry) => {
                if entry.config.enabled != enabled {
                    debug!(
                        "Provider '{}' {}",
                        name,
                        if enabled { "enabled" } else { "disabled" }
                    );
                }
                entry.config.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_priority(&mut self, name: &str, priority: i32) -> bool {
        match self.providers.get_mut(name) {
            Some(entry) => {
                entry.config.priority = priority;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<ProviderConfig> {
        self.providers.get(name).map(|p| p.config.clone())
    }

    /// `None` if not registered.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.providers.get(name).map(|p| p.config.enabled)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Every provider, by ascending priority.
    pub fn list_all(&self) -> Vec<ProviderConfig> {
        self.ordered(|_| true)
    }

    /// Enabled providers, by ascending priority.
    pub fn list_enabled(&self) -> Vec<ProviderConfig> {
        self.ordered(|p| p.enabled)
    }

    /// Providers (enabled or not) that supply `capability`, by ascending priority.
    pub fn by_capability(&self, capability: Capability) -> Vec<ProviderConfig> {
        self.ordered(|p| p.supports(capability))
    }

    pub fn stats(&self) -> RegistryStats {
        let providers = self.list_all();
        RegistryStats::from_providers(&providers)
    }

    /// Sort by priority, then by registration order.
    fn ordered(&self, filter: impl Fn(&ProviderConfig) -> bool) -> Vec<ProviderConfig> {
        let mut selected: Vec<&RegisteredProvider> = self
            .providers
            .values()
            .filter(|p| filter(&p.config))
            .collect();

        selected.sort_by_key(|p| (p.config.priority, p.seq));
        selected.into_iter().map(|p| p.config.clone()).collect()
    }

    pub fn health(&self, name: &str) -> Option<HealthRecord> {
        self.health.get(name).map(|h| h.record.clone())
    }

    /// Health records in priority order.
    pub fn health_records(&self) -> Vec<HealthRecord> {
        self.list_all()
            .iter()
            .filter_map(|p| self.health(&p.name))
            .collect()
    }

    pub(crate) fn health_state_mut(&mut self, name: &str) -> Option<&mut HealthState> {
        self.health.get_mut(name)
    }

    pub(crate) fn tracked_records(&self) -> impl Iterator<Item = &HealthRecord> {
        self.health.values().map(|h| &h.record)
    }
}
