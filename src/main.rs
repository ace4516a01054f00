//! SMTLab scheduler entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::info;

use smtlab_scheduler::domain::models::QueueTransport;
use smtlab_scheduler::domain::ports::ControlApi;
use smtlab_scheduler::infrastructure::api::SmtlabClient;
use smtlab_scheduler::infrastructure::config::ConfigLoader;
use smtlab_scheduler::infrastructure::{logging, queue};
use smtlab_scheduler::services::{spawn_workers, Dispatcher, SchedulerService, WorkerConfig};

#[derive(Parser)]
#[command(
    name = "smtlab-scheduler",
    version,
    about = "Scheduling core for the SMTLab benchmarking service"
)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Worker pool size override
    #[arg(long)]
    threads: Option<usize>,

    /// Queue transport override (http, redis, memory)
    #[arg(long)]
    queue: Option<QueueTransport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };
    if let Some(threads) = cli.threads {
        config.scheduler_threads = threads;
    }
    if let Some(transport) = cli.queue {
        config.queue.transport = transport;
    }
    ConfigLoader::validate(&config)?;

    let _log_guard = logging::init(&config.logging).context("Failed to initialise logging")?;
    info!("Starting SMTLab scheduler");

    // fatal startup errors: unreachable API or queue exit non-zero
    let client =
        Arc::new(SmtlabClient::new(&config).context("Failed to build control API client")?);
    client
        .health_check()
        .await
        .context("control API is unreachable")?;

    let queue = queue::connect(&config, Arc::clone(&client))
        .await
        .context("Failed to connect to queue endpoint")?;
    info!(transport = %config.queue.transport, "Connected to queue endpoint");

    let api: Arc<dyn ControlApi> = client;
    let scheduler = SchedulerService::new(api, Arc::clone(&queue));
    let dispatcher = Arc::new(Dispatcher::new(scheduler));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = spawn_workers(
        config.scheduler_threads,
        queue,
        dispatcher,
        WorkerConfig::from_config(&config),
        shutdown_rx,
    );
    info!(workers = config.scheduler_threads, "worker pool started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    info!("Caught signal, shutting down");
    let _ = shutdown_tx.send(true);
    join_all(workers).await;

    Ok(())
}
