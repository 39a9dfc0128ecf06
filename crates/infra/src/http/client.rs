//! HTTP client with built-in retry, backoff, and rate-limit handling.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use sellersync_domain::{ApiMethod, FetchConfig, FetchRequest, SellersyncError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::http::error::{classify_status, FetchError, StatusClass};

/// Retry/backoff tunables for one executor.
///
/// The attempt budget covers network and 5xx failures only; 429 responses
/// trigger the fixed cool-down and are retried at the same attempt index.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts for one logical request (initial try + retries).
    pub max_attempts: u32,
    /// Backoff base; attempt `n` sleeps `base_delay * n` before retrying.
    pub base_delay: Duration,
    /// Fixed cool-down after a 429 response.
    pub rate_limit_cooldown: Duration,
    /// Response body cap; bytes beyond it are discarded.
    pub body_limit: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            rate_limit_cooldown: Duration::from_secs(60),
            body_limit: 20 << 20,
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
            body_limit: config.body_limit_bytes,
        }
    }
}

/// HTTP executor for marketplace requests.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, SellersyncError> {
        Self::builder().build()
    }

    /// Execute one logical request under the retry policy.
    ///
    /// Classification per attempt:
    /// - transport failure / 5xx: retry with `base_delay * attempt` backoff
    ///   until the budget runs out
    /// - 401: fail immediately, no sleep
    /// - 429: cool down for the fixed window and retry the same attempt
    ///   index; the budget is untouched
    /// - 2xx: read the body up to the cap and return it
    /// - anything else: fail immediately with a body snippet
    ///
    /// Cancellation is observed before every attempt and inside every
    /// sleep.
    pub async fn execute(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 1;

        while attempt <= max_attempts {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            debug!(attempt, method = ?request.method, url = %request.url, "sending marketplace request");

            let response = match self.send_once(request).await {
                Ok(response) => response,
                Err(err) => {
                    if attempt == max_attempts {
                        return Err(FetchError::Network(err.to_string()));
                    }
                    warn!(attempt, max_attempts, error = %err, "transport failure, backing off");
                    self.backoff(attempt, cancel).await?;
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status().as_u16();
            match classify_status(status) {
                StatusClass::Success => return self.read_capped(response).await,
                StatusClass::Retryable => {
                    if attempt == max_attempts {
                        return Err(FetchError::Server { status });
                    }
                    warn!(status, attempt, max_attempts, "marketplace server error, retrying");
                    self.backoff(attempt, cancel).await?;
                    attempt += 1;
                }
                StatusClass::RateLimited => {
                    // Admission-control signal, not a failure: wait out the
                    // cool-down and retry without touching the budget.
                    warn!(
                        cooldown_secs = self.policy.rate_limit_cooldown.as_secs(),
                        "rate limited by marketplace, cooling down"
                    );
                    cancellable_sleep(self.policy.rate_limit_cooldown, cancel).await?;
                }
                StatusClass::Unauthorized => return Err(FetchError::Unauthorized),
                StatusClass::Fatal => {
                    let snippet = self.body_snippet(response).await;
                    return Err(FetchError::UnexpectedStatus { status, snippet });
                }
            }
        }

        Err(FetchError::MaxRetriesExceeded { attempts: max_attempts })
    }

    async fn send_once(&self, request: &FetchRequest) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = match request.method {
            ApiMethod::Get => self.client.get(&request.url),
            ApiMethod::Post => self.client.post(&request.url),
        };

        builder = builder
            .header("Authorization", request.credential.as_str())
            .header("Accept", "application/json");

        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        builder.send().await
    }

    /// Read up to `body_limit` bytes; the remainder is discarded rather
    /// than treated as an error.
    async fn read_capped(&self, mut response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.policy.body_limit;
        let mut body: Vec<u8> = Vec::new();

        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|err| FetchError::Network(format!("failed to read body: {err}")))?;
            let Some(chunk) = chunk else { break };

            let remaining = limit.saturating_sub(body.len());
            if remaining == 0 {
                break;
            }
            let take = remaining.min(chunk.len());
            body.extend_from_slice(&chunk[..take]);
        }

        Ok(body)
    }

    async fn body_snippet(&self, response: reqwest::Response) -> String {
        let bytes = self.read_capped(response).await.unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes);
        text.chars().take(256).collect()
    }

    async fn backoff(&self, attempt: u32, cancel: &CancellationToken) -> Result<(), FetchError> {
        let delay = self.policy.base_delay.saturating_mul(attempt);
        cancellable_sleep(delay, cancel).await
    }
}

/// Sleep that aborts with [`FetchError::Cancelled`] when the shared signal
/// fires. Every pacing and backoff delay in the fetch path goes through
/// this.
pub async fn cancellable_sleep(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), FetchError> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: RetryPolicy,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            policy: RetryPolicy::default(),
            user_agent: format!("sellersync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientBuilder {
    /// Overall per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, SellersyncError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| {
                SellersyncError::Config(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(HttpClient { client, policy: self.policy })
    }
}
