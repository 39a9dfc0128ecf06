//! HTTP executor for marketplace requests
//!
//! One logical request goes through a bounded retry/backoff policy with
//! uniform status classification; all sleeps are interruptible through the
//! shared cancellation token.

pub mod client;
pub mod error;

pub use client::{cancellable_sleep, HttpClient, HttpClientBuilder, RetryPolicy};
pub use error::{classify_status, FetchError, StatusClass};
