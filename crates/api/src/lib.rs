//! # Sellersync API
//!
//! REST surface for on-demand marketplace queries plus the shared
//! application context the service binary assembles at startup.
//!
//! Handlers are a thin shell: parse query parameters, call the core fetch
//! port, serialize the records as JSON. Upstream errors surface as 5xx
//! responses, missing parameters as 4xx.

pub mod context;
pub mod routes;

pub use context::AppContext;
pub use routes::router;
