//! HTTP JSON source.
//!
//! Issues a GET against a configured URL and returns the decoded JSON body as
//! the provider payload. The request is dropped as soon as the orchestrator
//! cancels the attempt.

use std::collections::BTreeMap;
use std::time::Duration;

use armory_feeds::{CancellationToken, FetchError, SourceFetcher};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Upper bound for a single request; the orchestrator's own timeout is
/// usually tighter.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches a JSON document from a fixed URL.
pub struct HttpJsonSource {
    client: Client,
    url: String,
    headers: BTreeMap<String, String>,
}

impl HttpJsonSource {
    pub fn new(client: Client, url: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        Self {
            client,
            url: url.into(),
            headers,
        }
    }

    /// Shared client for every source in the worker.
    pub fn default_client() -> Client {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new())
    }

    async fn get_json(&self) -> Result<Value, FetchError> {
        let mut request = self.client.get(&self.url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(format!("request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::new("rate limited (HTTP 429)"));
        }
        if !response.status().is_success() {
            return Err(FetchError::new(format!("HTTP error: {}", response.status())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::new(format!("invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl SourceFetcher for HttpJsonSource {
    async fn fetch(&self, cancel: CancellationToken) -> Result<Value, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::new("request cancelled")),
            result = self.get_json() => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_token_aborts_request() {
        // Non-routable address: the request would hang until the client timeout
        let source = HttpJsonSource::new(
            HttpJsonSource::default_client(),
            "http://10.255.255.1/stats.json",
            BTreeMap::new(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), source.fetch(cancel)).await;

        let err = result.expect("fetch should return promptly").unwrap_err();
        assert_eq!(err.message(), "request cancelled");
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_fetch_error() {
        let source = HttpJsonSource::new(Client::new(), "not a url", BTreeMap::new());

        let err = source.fetch(CancellationToken::new()).await.unwrap_err();

        assert!(err.message().starts_with("request failed"));
    }
}
