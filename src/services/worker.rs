//! Poll loop and worker pool.
//!
//! A fixed pool of identical workers, each independently polling the
//! `scheduler` queue, dispatching one message at a time, and backing
//! off exponentially while the queue is empty. Workers share nothing
//! mutable; the queue is the only coordination point.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::models::{Config, QueueName};
use crate::domain::ports::MessageQueue;

use super::dispatcher::Dispatcher;

/// Poll-loop pacing parameters.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Long-poll wait per receive.
    pub poll_wait: Duration,
    /// Cap on the empty-poll backoff exponent.
    pub backoff_limit: u32,
}

impl WorkerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_wait: Duration::from_secs(config.queue.poll_wait_secs),
            backoff_limit: config.queue_backoff_limit,
        }
    }
}

/// Idle sleep before the next poll: `0.1 * 2^exponent` seconds.
pub fn backoff_delay(exponent: u32) -> Duration {
    Duration::from_millis(100u64.saturating_mul(1u64 << exponent.min(32)))
}

/// Return the current idle delay and advance the exponent up to the
/// limit.
fn step_backoff(exponent: &mut u32, limit: u32) -> Duration {
    let delay = backoff_delay(*exponent);
    if *exponent < limit {
        *exponent += 1;
    }
    delay
}

/// Spawn the worker pool. Each worker owns clones of the shared
/// handles and runs until `shutdown` flips to true.
pub fn spawn_workers(
    count: usize,
    queue: Arc<dyn MessageQueue>,
    dispatcher: Arc<Dispatcher>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            tokio::spawn(run_worker(
                worker,
                Arc::clone(&queue),
                Arc::clone(&dispatcher),
                config.clone(),
                shutdown.clone(),
            ))
        })
        .collect()
}

/// One worker's poll loop.
///
/// A poll failure is logged and absorbed into the same backoff as an
/// empty poll; the worker never terminates on its own. A shutdown
/// signal lets the current dispatch finish before the worker exits.
pub async fn run_worker(
    worker: usize,
    queue: Arc<dyn MessageQueue>,
    dispatcher: Arc<Dispatcher>,
    config: WorkerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(worker, "worker started");
    let mut backoff_exponent: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let polled = tokio::select! {
            result = queue.poll(QueueName::Scheduler, 1, config.poll_wait) => result,
            _ = shutdown.changed() => break,
        };

        match polled {
            Ok(messages) if !messages.is_empty() => {
                for message in &messages {
                    debug!(worker, message_id = %message.id, "dispatching message");
                    dispatcher.dispatch(&message.body).await;
                    if let Err(err) = queue.ack(message).await {
                        warn!(
                            worker,
                            message_id = %message.id,
                            error = ?err,
                            "failed to ack message"
                        );
                    }
                }
                backoff_exponent = 0;
            }
            Ok(_) => {
                idle(&mut backoff_exponent, &config, &mut shutdown).await;
            }
            Err(err) => {
                warn!(worker, error = ?err, "queue poll failed");
                idle(&mut backoff_exponent, &config, &mut shutdown).await;
            }
        }
    }

    info!(worker, "worker stopped");
}

async fn idle(exponent: &mut u32, config: &WorkerConfig, shutdown: &mut watch::Receiver<bool>) {
    let delay = step_backoff(exponent, config.backoff_limit);
    tokio::select! {
        () = tokio::time::sleep(delay) => {}
        _ = shutdown.changed() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_doubles_from_100ms() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(4), Duration::from_millis(1_600));
        assert_eq!(backoff_delay(8), Duration::from_millis(25_600));
    }

    #[test]
    fn step_backoff_clamps_at_the_limit() {
        let mut exponent = 0;
        let mut delays = Vec::new();
        for _ in 0..12 {
            delays.push(step_backoff(&mut exponent, 8));
        }

        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[8], Duration::from_millis(25_600));
        // clamped thereafter
        assert_eq!(delays[11], Duration::from_millis(25_600));
        assert_eq!(exponent, 8);
    }

    #[test]
    fn backoff_resets_to_the_floor() {
        let mut exponent = 0;
        for _ in 0..5 {
            step_backoff(&mut exponent, 8);
        }
        // receiving a message resets the exponent
        exponent = 0;
        assert_eq!(step_backoff(&mut exponent, 8), Duration::from_millis(100));
    }
}
