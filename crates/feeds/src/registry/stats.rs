use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Capability, UpdateFrequency};
use crate::provider::ProviderConfig;

/// Catalogue summary returned by [`SourceRegistry::stats`](super::SourceRegistry::stats).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub by_update_frequency: BTreeMap<UpdateFrequency, usize>,
    /// Provider names per capability, in priority order.
    pub by_capability: BTreeMap<Capability, Vec<String>>,
    /// Mean static reliability of enabled providers. 0 when none are enabled.
    pub average_reliability: f64,
}

impl RegistryStats {
    /// Summarize providers already sorted by priority.
    pub(crate) fn from_providers<'a>(providers: impl IntoIterator<Item = &'a ProviderConfig>) -> Self {
        let mut stats = RegistryStats::default();
        let mut reliability_sum = 0.0;

        for provider in providers {
            stats.total += 1;
            if provider.enabled {
                stats.enabled += 1;
                reliability_sum += provider.reliability;
            } else {
                stats.disabled += 1;
            }

            *stats
                .by_update_frequency
                .entry(provider.update_frequency)
                .or_insert(0) += 1;

            for capability in &provider.capabilities {
                stats
                    .by_capability
                    .entry(*capability)
                    .or_default()
                    .push(provider.name.clone());
            }
        }

        if stats.enabled > 0 {
            stats.average_reliability = reliability_sum / stats.enabled as f64;
        }
        stats
    }
}
