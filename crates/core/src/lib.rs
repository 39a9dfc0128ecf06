//! # Sellersync Core
//!
//! Collection orchestration and port definitions for sellersync.
//!
//! This crate contains:
//! - Port traits implemented by the infra crate (`MarketDataSource`,
//!   `Publisher`)
//! - The immutable job registry (one entry per collection endpoint)
//! - The collection service that drives fetch → publish per job
//!
//! ## Architecture
//! - Depends only on `sellersync-domain`
//! - Contains no I/O; all impure work happens behind the ports

pub mod collect;
pub mod publish;

// Re-export commonly used items
pub use collect::jobs::{CollectionJob, JobRegistry};
pub use collect::ports::{FetchParams, MarketDataSource};
pub use collect::service::CollectionService;
pub use publish::ports::Publisher;
