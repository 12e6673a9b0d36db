use crate::cli::args::JenkinsArgs;
use crate::cli::helpers;
use crate::exit_codes;
use runboard_core::{IngestionScheduler, ResultStore};
use std::sync::Arc;

pub async fn run(args: &JenkinsArgs, store: ResultStore) -> anyhow::Result<i32> {
    let config = helpers::jenkins_config(args);
    let client = helpers::jenkins_client(&config)?;
    let scheduler = IngestionScheduler::new(Arc::new(client), store, config.branch.clone());

    // A fresh scheduler has nothing in flight, so `None` cannot happen here.
    let report = scheduler.run_once().await?.unwrap_or_default();
    tracing::info!(
        branch = %config.branch,
        fetched = report.fetched,
        inserted = report.summary.inserted,
        updated = report.summary.updated,
        "ingestion complete"
    );

    helpers::print_json(&report)?;
    Ok(exit_codes::SUCCESS)
}
