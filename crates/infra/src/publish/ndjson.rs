//! NDJSON sink: one envelope line per published record.

use async_trait::async_trait;
use chrono::Utc;
use sellersync_core::publish::ports::Publisher;
use sellersync_domain::{PublishConfig, Result, SellersyncError};
use serde_json::{json, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::info;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Publisher that appends one JSON line per message to stdout or a file.
///
/// The envelope is `{"topic", "key", "value", "ts"}`; `value` is embedded
/// as parsed JSON when possible, otherwise as a string. Safe for
/// concurrent use: writes are serialized behind an async mutex.
pub struct NdjsonPublisher {
    writer: Mutex<BoxedWriter>,
}

impl std::fmt::Debug for NdjsonPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdjsonPublisher").finish_non_exhaustive()
    }
}

impl NdjsonPublisher {
    /// Sink to stdout.
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    /// Sink to an append-only file. Failing here is fatal at startup: no
    /// data path can exist without the sink.
    pub async fn file(path: &str) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|err| {
                SellersyncError::Publish(format!("failed to open sink file '{path}': {err}"))
            })?;
        info!(path, "sink file opened");
        Ok(Self::from_writer(Box::new(file)))
    }

    pub async fn from_config(config: &PublishConfig) -> Result<Self> {
        match &config.output_path {
            Some(path) => Self::file(path).await,
            None => Ok(Self::stdout()),
        }
    }

    fn from_writer(writer: BoxedWriter) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

#[async_trait]
impl Publisher for NdjsonPublisher {
    async fn publish(&self, topic: &str, key: Option<&[u8]>, value: &[u8]) -> Result<()> {
        let value_json = serde_json::from_slice::<Value>(value)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(value).into_owned()));
        let line = json!({
            "topic": topic,
            "key": key.map(|k| String::from_utf8_lossy(k).into_owned()),
            "value": value_json,
            "ts": Utc::now().to_rfc3339(),
        });

        let mut buf = serde_json::to_vec(&line)
            .map_err(|err| SellersyncError::Publish(format!("failed to encode envelope: {err}")))?;
        buf.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&buf)
            .await
            .map_err(|err| SellersyncError::Publish(format!("sink write failed: {err}")))?;
        writer
            .flush()
            .await
            .map_err(|err| SellersyncError::Publish(format!("sink flush failed: {err}")))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .flush()
            .await
            .map_err(|err| SellersyncError::Publish(format!("sink flush failed: {err}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_one_envelope_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.ndjson");
        let path_str = path.to_str().unwrap();

        let publisher = NdjsonPublisher::file(path_str).await.unwrap();
        publisher
            .publish("marketplace.raw.orders", None, br#"{"id":1}"#)
            .await
            .unwrap();
        publisher
            .publish("marketplace.raw.sales", Some(b"sales"), br#"{"id":2}"#)
            .await
            .unwrap();
        publisher.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["topic"], "marketplace.raw.orders");
        assert_eq!(first["value"]["id"], 1);
        assert!(first["key"].is_null());

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["key"], "sales");
    }

    #[tokio::test]
    async fn close_is_safe_to_call_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.ndjson");
        let publisher = NdjsonPublisher::file(path.to_str().unwrap()).await.unwrap();

        publisher.close().await.unwrap();
        publisher.close().await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_sink_path_is_fatal() {
        let err = NdjsonPublisher::file("/nonexistent-dir/sink.ndjson").await.unwrap_err();
        assert!(matches!(err, SellersyncError::Publish(_)));
    }
}
