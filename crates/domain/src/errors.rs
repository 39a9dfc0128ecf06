//! Error types used throughout the service

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for sellersync
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SellersyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for sellersync operations
pub type Result<T> = std::result::Result<T, SellersyncError>;
