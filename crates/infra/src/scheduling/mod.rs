//! Scheduling infrastructure for the collection loop
//!
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support threaded into every job
//! - Structured tracing

pub mod collector_scheduler;
pub mod error;

pub use collector_scheduler::{CollectorScheduler, CollectorSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
