//! Port interface for the downstream message sink

use async_trait::async_trait;
use sellersync_domain::Result;

/// Downstream sink for normalized records.
///
/// Implementations must tolerate concurrent calls from every job of a
/// batch. Publish failures are logged by callers and never abort a job's
/// remaining work; the only fatal condition is failing to construct the
/// sink at startup.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message to the given topic.
    async fn publish(&self, topic: &str, key: Option<&[u8]>, value: &[u8]) -> Result<()>;

    /// Flush and release the sink.
    async fn close(&self) -> Result<()>;
}
