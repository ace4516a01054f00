//! Redis list-backed queue transport.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::{QueueMessage, QueueName};
use crate::domain::ports::MessageQueue;

/// Queue client over Redis lists.
///
/// Enqueue is `LPUSH`; receive is `BRPOPLPUSH` into a per-queue
/// processing list so an unacknowledged message survives a consumer
/// crash; `ack` removes the message from the processing list.
pub struct RedisQueue {
    manager: ConnectionManager,
}

impl RedisQueue {
    /// Connect and ping. An unreachable bus is a startup error.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis URL")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to connect to redis")?;
        let queue = Self { manager };
        queue.ping().await?;
        Ok(queue)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis ping failed")?;
        Ok(())
    }

    fn key(queue: QueueName) -> String {
        format!("smtlab:queue:{queue}")
    }

    fn processing_key(queue: QueueName) -> String {
        format!("smtlab:queue:{queue}:processing")
    }

    fn message(queue: QueueName, body: String) -> QueueMessage {
        QueueMessage {
            id: Uuid::new_v4().to_string(),
            queue,
            body,
        }
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn enqueue(&self, queue: QueueName, body: &Value) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: i64 = conn
            .lpush(Self::key(queue), body.to_string())
            .await
            .with_context(|| format!("failed to enqueue onto '{queue}'"))?;
        Ok(())
    }

    async fn poll(
        &self,
        queue: QueueName,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let mut messages = Vec::new();
        if max_messages == 0 {
            return Ok(messages);
        }

        let key = Self::key(queue);
        let processing = Self::processing_key(queue);
        let mut conn = self.manager.clone();

        // only the first receive blocks; the rest drain what is ready
        let first: Option<String> = conn
            .brpoplpush(&key, &processing, wait.as_secs_f64())
            .await
            .with_context(|| format!("failed to poll '{queue}'"))?;
        let Some(first) = first else {
            return Ok(messages);
        };
        messages.push(Self::message(queue, first));

        while messages.len() < max_messages {
            let next: Option<String> = conn
                .rpoplpush(&key, &processing)
                .await
                .with_context(|| format!("failed to poll '{queue}'"))?;
            match next {
                Some(body) => messages.push(Self::message(queue, body)),
                None => break,
            }
        }

        Ok(messages)
    }

    async fn ack(&self, message: &QueueMessage) -> Result<()> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn
            .lrem(Self::processing_key(message.queue), 1, &message.body)
            .await
            .with_context(|| format!("failed to ack on '{}'", message.queue))?;
        if removed == 0 {
            debug!(
                message_id = %message.id,
                queue = %message.queue,
                "ack found no matching message in the processing list"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keys_are_namespaced() {
        assert_eq!(RedisQueue::key(QueueName::Scheduler), "smtlab:queue:scheduler");
        assert_eq!(
            RedisQueue::processing_key(QueueName::Regression),
            "smtlab:queue:regression:processing"
        );
    }
}
