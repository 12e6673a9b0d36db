use crate::cli::args::JenkinsArgs;
use crate::cli::helpers;
use crate::exit_codes;
use anyhow::Context;
use runboard_core::{IngestionScheduler, ResultStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub async fn run(args: &JenkinsArgs, interval: Duration, store: ResultStore) -> anyhow::Result<i32> {
    let config = helpers::jenkins_config(args);
    let client = helpers::jenkins_client(&config)?;
    let scheduler = IngestionScheduler::new(Arc::new(client), store, config.branch.clone())
        .with_interval(interval);

    run_until(&scheduler, tokio::signal::ctrl_c()).await
}

/// Drive the scheduler until `signal` resolves, then let the current cycle finish.
/// Fails if the signal handler cannot be installed.
async fn run_until<S>(scheduler: &IngestionScheduler, signal: S) -> anyhow::Result<i32>
where
    S: Future<Output = std::io::Result<()>>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_loop = scheduler.run(shutdown_rx);
    tokio::pin!(scheduler_loop);

    tokio::select! {
        _ = &mut scheduler_loop => return Ok(exit_codes::SUCCESS),
        received = signal => {
            received.context("failed to listen for Ctrl-C")?;
            tracing::info!("received Ctrl-C, shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    scheduler_loop.await;
    Ok(exit_codes::SUCCESS)
}
