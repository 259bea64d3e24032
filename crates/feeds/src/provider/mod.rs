//! Data source abstractions.
//!
//! This module contains:
//! - The `SourceFetcher` trait every provider's fetch operation implements
//! - `FnFetcher` and `fetch_fn` for building fetchers from async closures
//! - `ProviderConfig`, the registry's description of one provider

mod config;
mod traits;

pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use traits::{fetch_fn, FnFetcher, SourceFetcher};
