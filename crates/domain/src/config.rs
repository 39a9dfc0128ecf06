//! Configuration structures
//!
//! All values are immutable after construction; the loader in the infra
//! crate populates them from environment variables or a config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoints::BaseUrls;
use crate::types::Credential;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Marketplace API access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Account tokens, iterated in order; blank entries are skipped.
    pub tokens: Vec<String>,
    #[serde(default)]
    pub base_urls: BaseUrls,
    /// Page size for offset/limit endpoints.
    pub page_size: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            base_urls: BaseUrls::default(),
            page_size: 1000,
            request_timeout_secs: 60,
        }
    }
}

impl MarketplaceConfig {
    /// Ordered credential list with blank entries dropped.
    pub fn credentials(&self) -> Vec<Credential> {
        self.tokens
            .iter()
            .map(Credential::new)
            .filter(|credential| !credential.is_blank())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry/backoff and pacing tunables for the fetch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Retry budget per logical request (network/5xx failures).
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds; attempt `n` sleeps `base * n`.
    pub base_delay_ms: u64,
    /// Fixed cool-down after a 429 response, in seconds. Rate-limit
    /// retries never consume the attempt budget.
    pub rate_limit_cooldown_secs: u64,
    /// Pacing delay between pages of one sweep, in milliseconds.
    pub page_delay_ms: u64,
    /// Pacing delay between credentials, in milliseconds.
    pub credential_delay_ms: u64,
    /// Response body cap in bytes; excess is discarded, not an error.
    pub body_limit_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2_000,
            rate_limit_cooldown_secs: 60,
            page_delay_ms: 600,
            credential_delay_ms: 500,
            body_limit_bytes: 20 << 20,
        }
    }
}

impl FetchConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn credential_delay(&self) -> Duration {
        Duration::from_millis(self.credential_delay_ms)
    }
}

/// Collection scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Tick interval in seconds.
    pub interval_secs: u64,
    pub enabled: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { interval_secs: 1_800, enabled: true }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Topic prefix; job topics are `<prefix>.<job>`.
    pub topic_prefix: String,
    /// Output file for the NDJSON publisher; `None` writes to stdout.
    pub output_path: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { topic_prefix: "marketplace.raw".to_string(), output_path: None }
    }
}

/// REST server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:8080".to_string() }
    }
}
