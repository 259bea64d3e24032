//! Fetch contract for data sources.
//!
//! The engine knows nothing about how a provider talks to its upstream. Each
//! provider exposes one zero-argument async operation that resolves with an
//! opaque JSON payload or fails.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::errors::FetchError;

/// Trait for data source fetchers.
///
/// Implement this trait to plug a new upstream feed into the engine.
/// The payload is not interpreted; schema handling happens downstream.
///
/// The `cancel` token is cancelled when the engine stops waiting for the
/// provider (its timeout fired). Honouring it is optional: an attempt that
/// ignores it keeps running in the background until it completes.
///
/// # Example
///
/// ```ignore
/// use armory_feeds::{FetchError, SourceFetcher};
///
/// struct TierListFeed {
///     client: reqwest::Client,
/// }
///
/// #[async_trait::async_trait]
/// impl SourceFetcher for TierListFeed {
///     async fn fetch(&self, _cancel: CancellationToken) -> Result<Value, FetchError> {
///         let resp = self.client.get(URL).send().await.map_err(FetchError::new)?;
///         resp.json().await.map_err(FetchError::new)
///     }
/// }
/// ```
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the provider's current payload.
    async fn fetch(&self, cancel: CancellationToken) -> Result<Value, FetchError>;
}

/// Fetcher backed by an async closure.
pub struct FnFetcher<F> {
    f: F,
}

impl<F, Fut> FnFetcher<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> SourceFetcher for FnFetcher<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    async fn fetch(&self, cancel: CancellationToken) -> Result<Value, FetchError> {
        (self.f)(cancel).await
    }
}

/// Wrap an async closure into a shareable fetcher.
pub fn fetch_fn<F, Fut>(f: F) -> Arc<dyn SourceFetcher>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    Arc::new(FnFetcher::new(f))
}
