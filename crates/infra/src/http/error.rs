//! Fetch error taxonomy and status classification

use sellersync_domain::SellersyncError;
use thiserror::Error;

/// Typed error surfaced by the HTTP executor and the page decoder.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout). Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// Marketplace returned 5xx on the last allowed attempt.
    #[error("marketplace server error: status {status}")]
    Server { status: u16 },

    /// Credential rejected; retrying the same request cannot succeed.
    #[error("unauthorized (401)")]
    Unauthorized,

    /// Non-retryable status outside the known classes.
    #[error("unexpected status {status}: {snippet}")]
    UnexpectedStatus { status: u16, snippet: String },

    /// Retry budget exhausted without a terminal classification.
    #[error("max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The shared cancellation signal fired mid-operation.
    #[error("operation cancelled")]
    Cancelled,
}

/// Mutually exclusive classification of one HTTP response.
///
/// `RateLimited` (429) is a class, not a terminal error: the executor
/// retries it indefinitely after a fixed cool-down without consuming the
/// attempt budget, so it can only end in success, a different class, or
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable,
    RateLimited,
    Unauthorized,
    Fatal,
}

/// Classify an HTTP status code.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        401 => StatusClass::Unauthorized,
        429 => StatusClass::RateLimited,
        500..=599 => StatusClass::Retryable,
        _ => StatusClass::Fatal,
    }
}

impl From<FetchError> for SellersyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(message) => SellersyncError::Network(message),
            FetchError::Unauthorized => SellersyncError::Auth("unauthorized (401)".to_string()),
            FetchError::Cancelled => SellersyncError::Internal("operation cancelled".to_string()),
            other => SellersyncError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_mutually_exclusive() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(401), StatusClass::Unauthorized);
        assert_eq!(classify_status(429), StatusClass::RateLimited);
        assert_eq!(classify_status(500), StatusClass::Retryable);
        assert_eq!(classify_status(503), StatusClass::Retryable);
        assert_eq!(classify_status(400), StatusClass::Fatal);
        assert_eq!(classify_status(404), StatusClass::Fatal);
        assert_eq!(classify_status(301), StatusClass::Fatal);
    }

    #[test]
    fn fetch_errors_map_into_domain_errors() {
        assert!(matches!(
            SellersyncError::from(FetchError::Network("refused".into())),
            SellersyncError::Network(_)
        ));
        assert!(matches!(
            SellersyncError::from(FetchError::Unauthorized),
            SellersyncError::Auth(_)
        ));
        assert!(matches!(
            SellersyncError::from(FetchError::Server { status: 502 }),
            SellersyncError::Upstream(_)
        ));
        assert!(matches!(
            SellersyncError::from(FetchError::Cancelled),
            SellersyncError::Internal(_)
        ));
    }
}
