//! Jenkins client for walking organization folders and pipeline history.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use runboard_core::{RunRecord, RunSource};
use tracing::{debug, info, warn};

use crate::config::JenkinsConfig;
use crate::error::{JenkinsError, JenkinsResult};
use crate::types::{JobList, WorkflowRun};

mod http;

use http::HttpBackend;

const USER_AGENT_VALUE: &str = concat!("runboard-jenkins/", env!("CARGO_PKG_VERSION"));

/// Jenkins client.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    http: HttpBackend,
}

impl JenkinsClient {
    /// Build a client; fails with `Config` if the URL or credentials are unusable.
    pub fn new(config: &JenkinsConfig) -> JenkinsResult<Self> {
        let endpoint = config.endpoint()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| JenkinsError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        info!(url = %endpoint.base_url, user = %endpoint.username, "Jenkins client configured");

        Ok(Self {
            http: HttpBackend { client, endpoint },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.http.endpoint.base_url
    }

    /// Names of folders bound to source control (one per project).
    pub async fn get_organizational_folders(&self) -> JenkinsResult<Vec<String>> {
        let url = format!("{}/api/json", self.base_url());
        debug!(url = %url, "fetching organizational folders");

        let list: JobList = self.http.get_json(&url).await?.unwrap_or_default();
        Ok(list
            .jobs
            .into_iter()
            .filter(|job| job.is_organization_folder())
            .filter_map(|job| job.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Repository names inside `folder`.
    pub async fn get_repos_in_folder(&self, folder: &str) -> JenkinsResult<Vec<String>> {
        let url = format!("{}/api/json", self.job_url(&[folder]));
        debug!(url = %url, folder = %folder, "fetching repositories in folder");

        let list: JobList = self.http.get_json(&url).await?.unwrap_or_default();
        Ok(list
            .jobs
            .into_iter()
            .filter_map(|job| job.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Run history of `branch` for one repository.
    pub async fn get_pipeline_history_for_repo(
        &self,
        project: &str,
        repository: &str,
        branch: &str,
    ) -> JenkinsResult<Vec<RunRecord>> {
        let url = format!("{}/wfapi/runs", self.job_url(&[project, repository, branch]));
        debug!(url = %url, repository = %repository, branch = %branch, "fetching pipeline history");

        // Decoded one run at a time: a single malformed entry must not hide the rest.
        let runs: Vec<serde_json::Value> = self.http.get_json(&url).await?.unwrap_or_default();
        let total = runs.len();
        let records: Vec<RunRecord> = runs
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<WorkflowRun>(value) {
                Ok(run) => run.to_record(project, repository),
                Err(e) => {
                    warn!(repository = %repository, error = %e, "skipping malformed run");
                    None
                }
            })
            .collect();

        if records.len() < total {
            debug!(
                repository = %repository,
                skipped = total - records.len(),
                "skipped unusable runs"
            );
        }
        Ok(records)
    }

    /// Run history of `branch` across every repository of every project.
    pub async fn get_pipeline_history_for_all_repos(
        &self,
        branch: &str,
    ) -> JenkinsResult<Vec<RunRecord>> {
        let mut records = Vec::new();
        let folders = self.get_organizational_folders().await?;

        for folder in &folders {
            let repos = self.get_repos_in_folder(folder).await?;
            info!(project = %folder, repositories = repos.len(), "retrieving pipeline history");
            for repo in &repos {
                records.extend(
                    self.get_pipeline_history_for_repo(folder, repo, branch)
                        .await?,
                );
            }
        }

        info!(
            projects = folders.len(),
            runs = records.len(),
            branch = %branch,
            "fetched pipeline history"
        );
        Ok(records)
    }

    fn job_url(&self, path: &[&str]) -> String {
        let mut url = self.base_url().to_string();
        for segment in path {
            url.push_str("/job/");
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

#[async_trait]
impl RunSource for JenkinsClient {
    async fn fetch_all_run_records(&self, branch: &str) -> anyhow::Result<Vec<RunRecord>> {
        Ok(self.get_pipeline_history_for_all_repos(branch).await?)
    }
}
