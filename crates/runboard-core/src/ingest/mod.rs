//! Periodic ingestion of CI run history into the [`ResultStore`](crate::ResultStore).

mod scheduler;

pub use scheduler::{CycleReport, IngestionScheduler, DEFAULT_INGEST_INTERVAL};

use crate::model::RunRecord;
use async_trait::async_trait;

/// Where run records come from.
///
/// # Contract
///
/// - Missing history (no folders, no repositories, 404 on a run list) is an
///   empty result, not an error.
/// - A malformed upstream response empties that one call only; the rest of the
///   traversal continues.
/// - `Err` is reserved for failures that make the whole fetch meaningless
///   (transport down, bad configuration).
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Fetch every run of `branch` across all projects and repositories.
    async fn fetch_all_run_records(&self, branch: &str) -> anyhow::Result<Vec<RunRecord>>;
}
