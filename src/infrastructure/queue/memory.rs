//! In-process queue transport.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::models::{QueueMessage, QueueName};
use crate::domain::ports::MessageQueue;

/// In-process realisation of the message bus.
///
/// Backs tests and single-process runs. The receive removes the
/// message, so `ack` is a no-op.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<QueueName, VecDeque<String>>>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending messages on a queue.
    pub async fn len(&self, queue: QueueName) -> usize {
        self.queues
            .lock()
            .await
            .get(&queue)
            .map_or(0, VecDeque::len)
    }

    /// Non-destructive copy of a queue's pending bodies, in order.
    pub async fn snapshot(&self, queue: QueueName) -> Vec<String> {
        self.queues
            .lock()
            .await
            .get(&queue)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn enqueue(&self, queue: QueueName, body: &Value) -> Result<()> {
        self.queues
            .lock()
            .await
            .entry(queue)
            .or_default()
            .push_back(body.to_string());
        self.notify.notify_one();
        Ok(())
    }

    async fn poll(
        &self,
        queue: QueueName,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + wait;

        loop {
            let notified = self.notify.notified();

            {
                let mut queues = self.queues.lock().await;
                if let Some(pending) = queues.get_mut(&queue) {
                    if !pending.is_empty() {
                        let n = max_messages.min(pending.len());
                        return Ok(pending
                            .drain(..n)
                            .map(|body| QueueMessage {
                                id: Uuid::new_v4().to_string(),
                                queue,
                                body,
                            })
                            .collect());
                    }
                }
            }

            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            tokio::select! {
                () = notified => {}
                () = tokio::time::sleep_until(deadline) => return Ok(Vec::new()),
            }
        }
    }

    async fn ack(&self, _message: &QueueMessage) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_poll_round_trips() {
        let queue = MemoryQueue::new();
        queue
            .enqueue(QueueName::Scheduler, &serde_json::json!({"action": "schedule", "id": 1}))
            .await
            .unwrap();

        let messages = queue
            .poll(QueueName::Scheduler, 1, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.contains("schedule"));
        assert_eq!(queue.len(QueueName::Scheduler).await, 0);
    }

    #[tokio::test]
    async fn poll_respects_max_messages() {
        let queue = MemoryQueue::new();
        for id in 0..5 {
            queue
                .enqueue(QueueName::Regression, &serde_json::json!({"id": id}))
                .await
                .unwrap();
        }

        let messages = queue
            .poll(QueueName::Regression, 2, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(queue.len(QueueName::Regression).await, 3);
    }

    #[tokio::test]
    async fn empty_poll_returns_after_wait() {
        let queue = MemoryQueue::new();
        let messages = queue
            .poll(QueueName::Performance, 1, Duration::from_millis(5))
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn queues_are_independent() {
        let queue = MemoryQueue::new();
        queue
            .enqueue(QueueName::Performance, &serde_json::json!({"id": 1}))
            .await
            .unwrap();

        assert_eq!(queue.len(QueueName::Regression).await, 0);
        assert_eq!(queue.len(QueueName::Performance).await, 1);
    }
}
