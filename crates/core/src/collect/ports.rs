//! Port interfaces for marketplace data access

use async_trait::async_trait;
use sellersync_domain::{MarketRecord, Result};
use tokio_util::sync::CancellationToken;

/// Parameters for one fetch operation against a logical endpoint.
#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    /// Query string pairs appended to the endpoint URL.
    pub query: Vec<(String, String)>,
    /// JSON payload for POST endpoints.
    pub payload: Option<serde_json::Value>,
}

impl FetchParams {
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Fetch access to the marketplace API.
///
/// The cancellation token must be observed before every HTTP call and
/// inside every pacing or backoff sleep.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Collection path: sweep the endpoint once per configured credential,
    /// isolating per-credential failures, and return the aggregate in
    /// credential order. Never fails on upstream errors; an empty
    /// aggregate is a valid outcome. Errs only for an unknown endpoint.
    async fn fetch_all(
        &self,
        endpoint: &str,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketRecord>>;

    /// Serving path: fetch with the first configured credential only and
    /// surface the upstream error when the sweep produced nothing.
    async fn fetch_first(
        &self,
        endpoint: &str,
        params: &FetchParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketRecord>>;
}
