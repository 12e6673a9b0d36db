//! Jenkins client for runboard.
//!
//! Walks a Jenkins instance the way its organization folders lay it out:
//!
//! ```text
//! {url}/api/json                                   organization folders (projects)
//! {url}/job/{project}/api/json                     repositories
//! {url}/job/{project}/job/{repo}/job/{branch}/wfapi/runs   run history
//! ```
//!
//! and turns each workflow run into a [`runboard_core::RunRecord`].
//! [`JenkinsClient`] implements [`runboard_core::RunSource`], so it plugs
//! straight into the ingestion scheduler.
//!
//! # Example
//!
//! ```no_run
//! use runboard_jenkins::{JenkinsClient, JenkinsConfig};
//!
//! # async fn example() -> Result<(), runboard_jenkins::JenkinsError> {
//! let config = JenkinsConfig::default()
//!     .with_url("https://jenkins.example.com")
//!     .with_credentials("bot:apitoken");
//! let client = JenkinsClient::new(&config)?;
//! let runs = client.get_pipeline_history_for_all_repos("develop").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::JenkinsClient;
pub use config::{build_auth_url, check_for_valid_url, Endpoint, JenkinsConfig, DEFAULT_BRANCH};
pub use error::{JenkinsError, JenkinsResult};
pub use types::{WorkflowRun, ORGANIZATION_FOLDER_CLASS};
