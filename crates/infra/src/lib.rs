//! # Sellersync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The retrying HTTP executor (reqwest)
//! - The marketplace API client (pagination + credential iteration)
//! - Publisher implementations for the record sink
//! - The interval collection scheduler
//! - The configuration loader (env first, file fallback)
//!
//! ## Architecture
//! - Implements traits defined in `sellersync-core`
//! - Depends on `sellersync-domain` and `sellersync-core`
//! - Contains all "impure" code (I/O, timers, process env)

pub mod config;
pub mod http;
pub mod marketplace;
pub mod publish;
pub mod scheduling;

// Re-export commonly used items
pub use http::{FetchError, HttpClient, RetryPolicy};
pub use marketplace::MarketClient;
pub use publish::{InMemoryPublisher, NdjsonPublisher};
pub use scheduling::{CollectorScheduler, CollectorSchedulerConfig};
