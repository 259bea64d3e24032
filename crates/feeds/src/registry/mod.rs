//! Source registry module.
//!
//! This module provides the catalogue of data sources:
//! - Provider registration and priority ordering
//! - Enabled flags driven by administrators and the health tracker
//! - Capability lookup and catalogue statistics

mod source_registry;
mod stats;

pub use source_registry::SourceRegistry;
pub use stats::RegistryStats;
