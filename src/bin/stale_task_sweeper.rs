//! Reclaims running tasks whose sandbox stopped reporting.
//!
//! Usage:
//!
//! ```text
//! stale_task_sweeper --config atelier.toml [--once]
//! ```
//!
//! Every `sweep.interval_secs` the sweeper moves tasks that have been
//! running without an update for longer than `sweep.stale_after_secs` to
//! `error`. With `--once` a single sweep runs and the process exits.

use atelier::config::{ConfigError, OrchestratorConfig};
use atelier::postgres::build_pool;
use atelier::sandbox::adapters::{HttpSandboxGateway, WebSocketConnector};
use atelier::sandbox::ports::SandboxGatewayError;
use atelier::sandbox::services::InterruptDispatcher;
use atelier::task::adapters::postgres::{
    PostgresTaskFileRepository, PostgresTaskMessageRepository, PostgresTaskRepository,
};
use atelier::task::services::{TaskDomainService, TaskServiceError};
use atelier::telemetry::init_tracing;
use atelier::topic::adapters::postgres::PostgresTopicRepository;
use atelier::workspace::adapters::postgres::PostgresWorkspaceRepository;
use clap::Parser;
use diesel::r2d2::PoolError;
use mockable::DefaultClock;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reclaims stale running tasks")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "atelier.toml")]
    config: PathBuf,
    /// Run a single sweep and exit.
    #[arg(long)]
    once: bool,
}

#[derive(Debug, Error)]
enum SweeperError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to build sandbox gateway client: {0}")]
    Gateway(#[from] SandboxGatewayError),
    #[error(transparent)]
    Sweep(#[from] TaskServiceError),
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), SweeperError> {
    let _installed = init_tracing();
    let args = Args::parse();
    let config = OrchestratorConfig::load(&args.config)?;
    let service = build_service(&config)?;
    let stale_after = config.sweep.stale_after();

    if args.once {
        let reclaimed = service.sweep_stale_running_tasks(stale_after).await?;
        info!(reclaimed, "single sweep finished");
        return Ok(());
    }

    let mut ticker = interval(config.sweep.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        interval_secs = config.sweep.interval_secs,
        stale_after_secs = config.sweep.stale_after_secs,
        "stale task sweeper started"
    );
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = service.sweep_stale_running_tasks(stale_after).await {
                    error!(error = %err, "stale task sweep failed");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(SweeperError::Signal)?;
                info!("shutdown requested, stopping sweeper");
                return Ok(());
            }
        }
    }
}

fn build_service(
    config: &OrchestratorConfig,
) -> Result<TaskDomainService<DefaultClock>, SweeperError> {
    let pool = build_pool(&config.database)?;
    let gateway = HttpSandboxGateway::new(&config.sandbox)?;
    let interrupts = InterruptDispatcher::new(
        Arc::new(gateway),
        Arc::new(WebSocketConnector::new()),
        config.sandbox.connect_timeout(),
    );
    Ok(TaskDomainService::new(
        Arc::new(PostgresTaskRepository::new(pool.clone())),
        Arc::new(PostgresTaskFileRepository::new(pool.clone())),
        Arc::new(PostgresTaskMessageRepository::new(pool.clone())),
        Arc::new(PostgresTopicRepository::new(pool.clone())),
        Arc::new(PostgresWorkspaceRepository::new(pool)),
        interrupts,
        Arc::new(DefaultClock),
    ))
}
