//! Queue transport realisations.
//!
//! Three implementations of the [`MessageQueue`] port:
//! - [`HttpQueue`]: the control API's `queues/{name}` endpoints
//! - [`RedisQueue`]: Redis lists with a per-queue processing list
//! - [`MemoryQueue`]: in-process, for tests and single-process runs

pub mod http;
pub mod memory;
pub mod redis;

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::{Config, QueueTransport};
use crate::domain::ports::MessageQueue;
use crate::infrastructure::api::SmtlabClient;

pub use http::HttpQueue;
pub use memory::MemoryQueue;
pub use redis::RedisQueue;

/// Build the configured queue transport. The redis transport connects
/// and pings eagerly so an unreachable bus fails startup.
pub async fn connect(config: &Config, client: Arc<SmtlabClient>) -> Result<Arc<dyn MessageQueue>> {
    match config.queue.transport {
        QueueTransport::Http => Ok(Arc::new(HttpQueue::new(client))),
        QueueTransport::Redis => Ok(Arc::new(RedisQueue::connect(&config.queue.redis_url).await?)),
        QueueTransport::Memory => Ok(Arc::new(MemoryQueue::new())),
    }
}
