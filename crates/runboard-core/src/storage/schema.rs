//! SQLite schema for pipeline run storage.
//!
//! Tables:
//! - `pipeline_runs`: one row per run id; mutable only while `status = 'IN_PROGRESS'`

/// DDL for the run store. Idempotent; there is no migration tooling.
pub const RUNS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pipeline_runs (
    id               TEXT PRIMARY KEY CHECK (length(id) > 0),
    run_id           TEXT NOT NULL,
    project          TEXT NOT NULL,
    repository       TEXT NOT NULL,
    status           TEXT NOT NULL,
    timestamp        INTEGER NOT NULL,
    success          INTEGER NOT NULL CHECK (success IN (0, 1)),
    stage_failed     TEXT,
    error_type       TEXT,
    error_message    TEXT
);

CREATE INDEX IF NOT EXISTS idx_pipeline_runs_project
    ON pipeline_runs(project);
CREATE INDEX IF NOT EXISTS idx_pipeline_runs_repository
    ON pipeline_runs(repository);
CREATE INDEX IF NOT EXISTS idx_pipeline_runs_success
    ON pipeline_runs(success);
"#;
