//! Publisher implementations for the record sink
//!
//! The broker wire protocol is outside this service; the sink contract is
//! the `Publisher` port in `sellersync-core`. The NDJSON publisher is the
//! production stand-in (stdout or an append-only file), the in-memory
//! publisher backs tests.

pub mod memory;
pub mod ndjson;

pub use memory::{InMemoryPublisher, PublishedMessage};
pub use ndjson::NdjsonPublisher;
