//! Pipeline run store and failure heatmap engine.
//!
//! This crate holds the core of runboard:
//!
//! - [`model`]: the [`RunRecord`] persisted for every pipeline execution attempt
//! - [`storage`]: the idempotent SQLite-backed [`ResultStore`]
//! - [`heatmap`]: the pure stage x project/repository failure matrix transform
//! - [`query`]: the read-side [`QueryFacade`] composed over the store
//! - [`ingest`]: the periodic [`IngestionScheduler`] fed by a [`RunSource`]
//! - [`api`]: request routing and JSON response shaping for the read side
//!
//! # Quick Start
//!
//! ```no_run
//! use runboard_core::{GroupBy, QueryFacade, ResultStore};
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = ResultStore::connect("sqlite:///var/lib/runboard/runs.db")?;
//! let facade = QueryFacade::new(store);
//!
//! let matrix = facade.heatmap(None)?;
//! println!("{} stages x {} projects", matrix.x.len(), matrix.y.len());
//! # let _ = GroupBy::Project;
//! # Ok(())
//! # }
//! ```
//!
//! # Upsert rules
//!
//! A run is inserted the first time its id is seen. While the stored row is
//! `IN_PROGRESS` every later report for the same id overwrites it; once the row
//! holds a terminal status it is frozen.

pub mod api;
pub mod heatmap;
pub mod ingest;
pub mod model;
pub mod query;
pub mod storage;

pub use api::ApiResponse;
pub use heatmap::{build_heatmap, GroupBy, Matrix, UNATTRIBUTED_STAGE};
pub use ingest::{CycleReport, IngestionScheduler, RunSource, DEFAULT_INGEST_INTERVAL};
pub use model::{RunId, RunRecord, RunStatus};
pub use query::{weeks_ago_cutoff, QueryError, QueryFacade, ResultsQuery, WEEK_MS};
pub use storage::{BatchSummary, ResultStore, StoreError, UpsertOutcome};
