//! Collection pipeline: job registry, fetch port, and the service that
//! drives one job through fetch → publish.

pub mod jobs;
pub mod ports;
pub mod service;

pub use jobs::{CollectionJob, JobRegistry};
pub use ports::{FetchParams, MarketDataSource};
pub use service::CollectionService;
