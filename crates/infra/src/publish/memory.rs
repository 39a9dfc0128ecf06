//! In-memory publisher used by tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sellersync_core::publish::ports::Publisher;
use sellersync_domain::Result;

/// One captured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

/// Publisher that records messages in memory; tolerates concurrent use
/// from every job of a batch.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    closed: AtomicBool,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn count_for(&self, topic: &str) -> usize {
        self.messages().iter().filter(|m| m.topic == topic).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, topic: &str, key: Option<&[u8]>, value: &[u8]) -> Result<()> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(PublishedMessage {
                topic: topic.to_string(),
                key: key.map(<[u8]>::to_vec),
                value: value.to_vec(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
