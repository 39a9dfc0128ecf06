//! Shared application context for the REST handlers

use std::sync::Arc;

use sellersync_core::collect::ports::MarketDataSource;
use sellersync_core::publish::ports::Publisher;
use sellersync_domain::Config;
use tokio_util::sync::CancellationToken;

/// Read-only wiring shared by every request handler.
pub struct AppContext {
    pub config: Config,
    pub source: Arc<dyn MarketDataSource>,
    pub publisher: Arc<dyn Publisher>,
    /// Process shutdown signal; threaded into handler-initiated fetches so
    /// in-flight upstream calls abort with the server.
    pub shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(
        config: Config,
        source: Arc<dyn MarketDataSource>,
        publisher: Arc<dyn Publisher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { config, source, publisher, shutdown }
    }
}
