//! Row mapping between `pipeline_runs` and [`RunRecord`].

use crate::model::{RunId, RunRecord, RunStatus};

/// Column order expected by [`row_to_record`]. `success` is derived, so it is not read back.
pub(crate) const RUN_COLUMNS: &str =
    "id, run_id, project, repository, status, timestamp, stage_failed, error_type, error_message";

/// [`RUN_COLUMNS`] qualified with a table alias, for joins.
pub(crate) fn qualified_columns(alias: &str) -> String {
    RUN_COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        run_id: RunId::new(row.get::<_, String>(1)?),
        project: row.get(2)?,
        repository: row.get(3)?,
        status: RunStatus::parse(&row.get::<_, String>(4)?),
        timestamp: row.get(5)?,
        stage_failed: row.get(6)?,
        error_type: row.get(7)?,
        error_message: row.get(8)?,
    })
}
