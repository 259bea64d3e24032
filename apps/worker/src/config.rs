//! Worker configuration.
//!
//! Engine settings come from `ARMORY_*` environment variables (a `.env` file
//! is honoured); the list of HTTP sources comes from a JSON file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use armory_feeds::{Capability, OrchestratorConfig, ProviderConfig, UpdateFrequency};
use reqwest::Client;
use serde::Deserialize;

use crate::http_source::HttpJsonSource;

const DEFAULT_SOURCES_FILE: &str = "sources.json";
const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;

pub struct Config {
    pub sources_file: PathBuf,
    /// Time between scheduled runs.
    pub interval: Duration,
    /// Run a single fetch, print the aggregate and exit.
    pub run_once: bool,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut orchestrator = OrchestratorConfig::default();

        if let Some(v) = parse(&lookup, "ARMORY_TIMEOUT_MS")? {
            orchestrator.timeout_ms = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_MAX_RETRIES")? {
            orchestrator.max_retries = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_PARALLEL")? {
            orchestrator.parallel_execution = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_FAIL_FAST")? {
            orchestrator.fail_fast = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_MIN_SOURCES")? {
            orchestrator.min_successful_sources = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_BASE_DELAY_MS")? {
            orchestrator.base_delay_ms = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_MAX_DELAY_MS")? {
            orchestrator.max_delay_ms = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_EXPONENTIAL_BACKOFF")? {
            orchestrator.exponential_backoff = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_JITTER")? {
            orchestrator.jitter = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_AUTO_DISABLE_THRESHOLD")? {
            orchestrator.auto_disable_threshold = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_HEALTH_PROBE_TIMEOUT_MS")? {
            orchestrator.health_probe_timeout_ms = v;
        }
        if let Some(v) = parse(&lookup, "ARMORY_HISTORY_CAPACITY")? {
            orchestrator.history_capacity = v;
        }
        orchestrator.validate()?;

        let interval_secs = parse(&lookup, "ARMORY_INTERVAL_SECS")?.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(anyhow!("ARMORY_INTERVAL_SECS must be positive"));
        }

        Ok(Self {
            sources_file: lookup("ARMORY_SOURCES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCES_FILE)),
            interval: Duration::from_secs(interval_secs),
            run_once: parse(&lookup, "ARMORY_RUN_ONCE")?.unwrap_or(false),
            orchestrator,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{} has invalid value '{}': {}", key, raw, e)),
    }
}

/// One entry of the sources file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    #[serde(default)]
    pub update_frequency: UpdateFrequency,
    #[serde(default)]
    pub reliability: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    sources: Vec<SourceSpec>,
}

impl SourceSpec {
    pub fn into_provider(self, client: &Client) -> armory_feeds::Result<ProviderConfig> {
        let fetch = Arc::new(HttpJsonSource::new(client.clone(), self.url, self.headers));
        let mut builder = ProviderConfig::builder(self.name)
            .capabilities(self.capabilities)
            .update_frequency(self.update_frequency)
            .enabled(self.enabled)
            .fetch(fetch);

        if let Some(priority) = self.priority {
            builder = builder.priority(priority);
        }
        if let Some(reliability) = self.reliability {
            builder = builder.reliability(reliability);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        builder.build()
    }
}

pub fn parse_sources(json: &str) -> anyhow::Result<Vec<SourceSpec>> {
    let file: SourcesFile = serde_json::from_str(json).context("malformed sources file")?;
    Ok(file.sources)
}

pub fn load_sources(path: &std::path::Path) -> anyhow::Result<Vec<SourceSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sources file {}", path.display()))?;
    parse_sources(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.orchestrator, OrchestratorConfig::default());
        assert_eq!(config.interval, Duration::from_secs(900));
        assert_eq!(config.sources_file, PathBuf::from("sources.json"));
        assert!(!config.run_once);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ARMORY_TIMEOUT_MS", "5000"),
            ("ARMORY_PARALLEL", "false"),
            ("ARMORY_FAIL_FAST", "true"),
            ("ARMORY_MAX_RETRIES", " 1 "),
            ("ARMORY_RUN_ONCE", "true"),
            ("ARMORY_SOURCES_FILE", "/etc/armory/sources.json"),
        ]))
        .unwrap();

        assert_eq!(config.orchestrator.timeout_ms, 5000);
        assert!(!config.orchestrator.parallel_execution);
        assert!(config.orchestrator.fail_fast);
        assert_eq!(config.orchestrator.max_retries, 1);
        assert!(config.run_once);
        assert_eq!(
            config.sources_file,
            PathBuf::from("/etc/armory/sources.json")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("ARMORY_TIMEOUT_MS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ARMORY_TIMEOUT_MS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ARMORY_INTERVAL_SECS", "0")])).is_err());
    }

    #[test]
    fn test_parse_sources() {
        let specs = parse_sources(
            r#"{
                "sources": [
                    {
                        "name": "tier-list",
                        "url": "https://example.com/tiers.json",
                        "priority": 1,
                        "capabilities": ["tier_rankings", "pick_rates"],
                        "updateFrequency": "hourly",
                        "timeoutMs": 2000,
                        "headers": { "Authorization": "Bearer token" }
                    },
                    { "name": "patches", "url": "https://example.com/patches.json", "enabled": false }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].capabilities.len(), 2);
        assert_eq!(specs[0].update_frequency, UpdateFrequency::Hourly);
        assert!(specs[0].enabled);
        assert!(!specs[1].enabled);

        let provider = specs
            .into_iter()
            .next()
            .unwrap()
            .into_provider(&Client::new())
            .unwrap();
        assert_eq!(provider.priority, 1);
        assert!(provider.supports(Capability::TierRankings));
        assert_eq!(provider.timeout_override, Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_malformed_sources_file() {
        assert!(parse_sources(r#"{ "sources": [ { "name": "x" } ] }"#).is_err());
        assert!(parse_sources("[]").is_err());
    }
}
