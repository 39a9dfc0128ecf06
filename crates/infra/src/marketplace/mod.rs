//! Marketplace API client
//!
//! Drives the HTTP executor through paginated sweeps and credential
//! iteration, decoding opaque vendor payloads into raw records.

pub mod client;
pub mod pages;

pub use client::MarketClient;
pub use pages::Page;
