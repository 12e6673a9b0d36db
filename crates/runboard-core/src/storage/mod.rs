//! SQLite-backed persistence for pipeline runs.
//!
//! - [`ResultStore`]: the store handle (cheap to clone, one connection behind a mutex)
//! - `upsert`: idempotent insert / in-progress overwrite, single and batched
//! - `reads`: filtered listings and distinct projections
//! - `latest`: per-repository latest-run resolution with numeric run id ordering

mod latest;
mod reads;
pub mod rows;
pub mod schema;
mod store;
mod upsert;

pub use schema::RUNS_SCHEMA;
pub use store::{DatabaseLocation, ResultStore, StoreError};
pub use upsert::{BatchSummary, UpsertOutcome};
