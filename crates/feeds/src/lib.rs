//! Armory Feeds Crate
//!
//! Orchestrates several independent sources of weapon and meta statistics
//! (stat sheets, tier lists, pick rates, ballistics, attachments, patch
//! notes) behind one fetch call.
//!
//! # Overview
//!
//! The feeds crate supports:
//! - A registry of prioritized providers with capability tags
//! - Parallel or sequential runs with per-provider timeout and retry
//! - Health tracking with automatic disable and re-enable
//! - Cumulative metrics and a bounded execution history
//!
//! # Architecture
//!
//! ```text
//!                          +------------------+
//!                          |   Orchestrator   |  (fetch_all / fetch_subset)
//!                          +------------------+
//!                            |             |
//!                            v             v
//!                 +----------------+   +------------------+
//!                 | SourceRegistry |   |    Executor      |  (timeout + retry)
//!                 +----------------+   +------------------+
//!                            |             |
//!                            |             v
//!                            |     +------------------+
//!                            |     |  SourceFetcher   |  (provider I/O)
//!                            |     +------------------+
//!                            |             |
//!                            v             v
//!                 +----------------+   +------------------+
//!                 | HealthTracker  |<--| ExecutionOutcome |
//!                 +----------------+   +------------------+
//!                                          |
//!                                          v
//!                                  +------------------+
//!                                  | ExecutionLedger  |  (metrics + history)
//!                                  +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Orchestrator`] - Entry point; owns registry, tracker and ledger
//! - [`ProviderConfig`] - One provider: priority, capabilities, fetch operation
//! - [`SourceFetcher`] - Async fetch contract implemented by every provider
//! - [`AggregateResult`] - Payloads keyed by provider plus run metadata
//! - [`HealthRecord`] - Rolling health of one provider
//! - [`RetryPolicy`] - Backoff parameters

pub mod engine;
pub mod errors;
pub mod health;
pub mod ledger;
pub mod models;
pub mod provider;
pub mod registry;
pub mod retry;

pub use engine::{Orchestrator, OrchestratorConfig};
pub use errors::{FeedError, FetchError, Result};
pub use health::{HealthPolicy, HealthTracker};
pub use ledger::{ExecutionLedger, HistoryLedger, MetricsCollector};
pub use models::{
    flatten_payloads, AggregateMetadata, AggregateResult, Capability, ExecutionOutcome,
    HealthRecord, HealthStatus, OrchestratorMetrics, OutcomeStatus, OverallHealth,
    ProviderMetrics, RunMode, SourceError, UpdateFrequency,
};
pub use provider::{fetch_fn, FnFetcher, ProviderConfig, ProviderConfigBuilder, SourceFetcher};
pub use registry::{RegistryStats, SourceRegistry};
pub use retry::RetryPolicy;

pub use tokio_util::sync::CancellationToken;
