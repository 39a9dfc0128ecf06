//! Common data types used throughout the service

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoints::ApiMethod;

/// One raw marketplace record.
///
/// Vendor payloads carry no static schema, so records flow through the
/// service as tagged JSON objects and are only interpreted at the decoding
/// boundary (locating the records array and the pagination signal).
pub type MarketRecord = serde_json::Map<String, serde_json::Value>;

/// An opaque authorization token identifying one upstream seller account.
///
/// The raw token is available via [`Credential::as_str`] for building the
/// `Authorization` header; logs must use [`Credential::masked`] only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank credentials are skipped during iteration.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Masked form safe for logging: first four characters plus length.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}***({})", prefix, self.0.len())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// One logical HTTP call against the marketplace API.
///
/// Immutable once constructed; the executor may issue it several times
/// under its retry policy.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: ApiMethod,
    pub url: String,
    pub credential: Credential,
    pub payload: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, credential: Credential) -> Self {
        Self { method: ApiMethod::Get, url: url.into(), credential, payload: None }
    }

    pub fn post(
        url: impl Into<String>,
        credential: Credential,
        payload: serde_json::Value,
    ) -> Self {
        Self { method: ApiMethod::Post, url: url.into(), credential, payload: Some(payload) }
    }
}

/// Per-job result of one collection cycle.
///
/// Used for logging only; a job's outcome never affects sibling jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOutcome {
    /// Job name (matches the registry entry).
    pub job: String,
    /// Records fetched from the marketplace.
    pub fetched: usize,
    /// Records accepted by the sink.
    pub published: usize,
    /// Error that ended the job early, if any.
    pub error: Option<String>,
    /// Wall-clock duration of the cycle in milliseconds.
    pub elapsed_ms: u64,
}

impl CollectionOutcome {
    pub fn new(job: impl Into<String>) -> Self {
        Self { job: job.into(), fetched: 0, published: 0, error: None, elapsed_ms: 0 }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
