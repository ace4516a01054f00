//! HTTP-mediated queue exposed by the control API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::{QueueMessage, QueueName};
use crate::domain::ports::MessageQueue;
use crate::infrastructure::api::SmtlabClient;

/// Queue client backed by `GET`/`POST queues/{name}` on the control
/// API.
///
/// The GET is a destructive read: every returned message is already
/// consumed, so `ack` is a no-op and a poll may return more messages
/// than requested. The API answers immediately; idle pacing comes
/// from the caller's backoff, not a server-side long poll.
pub struct HttpQueue {
    client: Arc<SmtlabClient>,
}

impl HttpQueue {
    pub fn new(client: Arc<SmtlabClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for HttpQueue {
    async fn enqueue(&self, queue: QueueName, body: &Value) -> Result<()> {
        self.client.post_queue(queue.as_str(), body).await?;
        Ok(())
    }

    async fn poll(
        &self,
        queue: QueueName,
        _max_messages: usize,
        _wait: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let raw = self.client.get_queue(queue.as_str()).await?;
        Ok(raw
            .into_iter()
            .map(|value| QueueMessage {
                id: Uuid::new_v4().to_string(),
                queue,
                // the API delivers messages as JSON strings
                body: match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect())
    }

    async fn ack(&self, _message: &QueueMessage) -> Result<()> {
        Ok(())
    }
}
