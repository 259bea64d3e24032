//! Feed models
//!
//! This module contains the data types shared by every component:
//! - `capability` - Closed set of data kinds (Capability) and UpdateFrequency
//! - `outcome` - Per-provider execution results (ExecutionOutcome, OutcomeStatus)
//! - `aggregate` - The run envelope (AggregateResult, AggregateMetadata)
//! - `health` - Provider and engine health (HealthRecord, OverallHealth)
//! - `metrics` - Cumulative counters (OrchestratorMetrics, ProviderMetrics)

mod aggregate;
mod capability;
mod health;
mod metrics;
mod outcome;

pub use aggregate::{flatten_payloads, AggregateMetadata, AggregateResult, RunMode, SourceError};
pub use capability::{Capability, UpdateFrequency};
pub use health::{HealthRecord, HealthStatus, OverallHealth};
pub use metrics::{OrchestratorMetrics, ProviderMetrics};
pub use outcome::{ExecutionOutcome, OutcomeStatus};
