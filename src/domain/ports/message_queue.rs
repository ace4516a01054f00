use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::models::{QueueMessage, QueueName};

/// Port for the named multi-queue message bus.
///
/// Two production realisations exist behind this trait: the
/// HTTP-mediated queue exposed by the control API and a Redis
/// list-backed bus. Handlers never learn which one is in use.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Fire-and-forget send. A transport failure propagates to the
    /// caller.
    async fn enqueue(&self, queue: QueueName, body: &Value) -> Result<()>;

    /// Long-polling receive of up to `max_messages` messages, waiting
    /// at most `wait` for the first one. May return zero messages;
    /// the HTTP transport may return more than requested, and the
    /// poll loop dispatches every returned message.
    async fn poll(
        &self,
        queue: QueueName,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>>;

    /// Delete a received message from the queue. Transports whose
    /// receive already consumed the message treat this as a no-op.
    async fn ack(&self, message: &QueueMessage) -> Result<()>;
}
