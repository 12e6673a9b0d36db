use crate::exit_codes;
use anyhow::Context;
use runboard_core::{ApiResponse, ResultStore, StoreError};
use runboard_jenkins::{JenkinsClient, JenkinsConfig};
use serde::Serialize;

use super::args::{Cli, JenkinsArgs};

/// `--database-url` / `RUNBOARD_DATABASE_URL`, then `DATABASE_URL`.
pub fn database_url(cli: &Cli) -> Option<String> {
    cli.database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
}

pub fn open_store(cli: &Cli) -> anyhow::Result<ResultStore> {
    let url = database_url(cli).ok_or_else(|| StoreError::Config {
        message: "no database connection URL provided (set --database-url or RUNBOARD_DATABASE_URL)"
            .to_string(),
    })?;
    let store = ResultStore::connect(&url).context("failed to open run store")?;
    tracing::debug!(url = %url, "run store opened");
    Ok(store)
}

pub fn jenkins_config(args: &JenkinsArgs) -> JenkinsConfig {
    let mut config = JenkinsConfig::default()
        .with_branch(args.branch.clone())
        .with_timeout_secs(args.timeout_secs);
    if let Some(url) = &args.jenkins_url {
        config = config.with_url(url.clone());
    }
    if let Some(credentials) = args.jenkins_credentials.as_ref().filter(|c| !c.trim().is_empty()) {
        config = config.with_credentials(credentials.clone());
    }
    config
}

pub fn jenkins_client(config: &JenkinsConfig) -> anyhow::Result<JenkinsClient> {
    JenkinsClient::new(config).context("invalid Jenkins configuration")
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a response body to stdout and map its status to an exit code.
pub fn emit(response: &ApiResponse) -> anyhow::Result<i32> {
    print_json(&response.body)?;
    Ok(exit_codes::for_status(response.status))
}
