use super::RunSource;
use crate::storage::{BatchSummary, ResultStore};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default time between ingestion cycles.
pub const DEFAULT_INGEST_INTERVAL: Duration = Duration::from_secs(3600);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of one completed ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Records returned by the source.
    pub fetched: usize,
    pub summary: BatchSummary,
}

/// Drives `fetch -> upsert_batch` on a fixed interval.
///
/// At most one cycle runs at a time per scheduler, whether started by the
/// loop or by [`IngestionScheduler::run_once`].
pub struct IngestionScheduler {
    source: Arc<dyn RunSource>,
    store: ResultStore,
    branch: String,
    interval: Duration,
    in_flight: Mutex<()>,
}

impl IngestionScheduler {
    pub fn new(source: Arc<dyn RunSource>, store: ResultStore, branch: impl Into<String>) -> Self {
        Self {
            source,
            store,
            branch: branch.into(),
            interval: DEFAULT_INGEST_INTERVAL,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Run a single cycle.
    ///
    /// Returns `Ok(None)` without doing anything if another cycle is in flight.
    /// On error nothing from this cycle is persisted.
    pub async fn run_once(&self) -> anyhow::Result<Option<CycleReport>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(branch = %self.branch, "ingestion cycle already in flight");
            return Ok(None);
        };

        let records = self
            .source
            .fetch_all_run_records(&self.branch)
            .await
            .context("failed to fetch run records")?;

        let fetched = records.len();
        if records.is_empty() {
            debug!(branch = %self.branch, "no run records fetched");
            return Ok(Some(CycleReport::default()));
        }

        let store = self.store.clone();
        let summary = tokio::task::spawn_blocking(move || store.upsert_batch(&records))
            .await
            .context("run batch task aborted")?
            .context("failed to persist run batch")?;

        Ok(Some(CycleReport { fetched, summary }))
    }

    /// Run cycles until `shutdown` turns `true` (or its sender is dropped).
    ///
    /// The first cycle starts immediately. Failed cycles are logged; the next
    /// tick is the retry. Shutdown is observed between cycles.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            branch = %self.branch,
            interval_secs = self.interval.as_secs(),
            "ingestion scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(branch = %self.branch, "ingestion scheduler stopped");
    }

    async fn tick(&self) {
        match self.run_once().await {
            Ok(Some(report)) => info!(
                fetched = report.fetched,
                inserted = report.summary.inserted,
                updated = report.summary.updated,
                unchanged = report.summary.unchanged,
                "ingestion cycle complete"
            ),
            Ok(None) => warn!("previous ingestion cycle still running, skipping tick"),
            Err(e) => error!(error = %format!("{e:#}"), "ingestion cycle failed"),
        }
    }
}
