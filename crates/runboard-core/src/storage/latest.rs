//! Latest-run resolution: per repository, the row with the numerically highest run id.
//!
//! Run ids are stored as text, so the maximum is taken over the integer value
//! of all-digit ids; comparing the text would rank `"99"` above `"100"`. Ids
//! that are not plain decimal integers rank below every numeric one, matching
//! [`RunId`](crate::model::RunId) ordering, which also settles ties such as `"7"` vs `"07"`.

use super::rows::{qualified_columns, row_to_record};
use super::store::{ResultStore, StoreError};
use crate::model::RunRecord;
use rusqlite::types::Value;
use rusqlite::params_from_iter;

// `CAST` alone would read the digit prefix of "11x" as 11.
fn run_number(column: &str) -> String {
    format!(
        "CASE WHEN {c} <> '' AND {c} NOT GLOB '*[^0-9]*' THEN CAST({c} AS INTEGER) ELSE -1 END",
        c = column
    )
}

impl ResultStore {
    /// Latest run of every repository.
    pub fn get_latest_results(&self) -> Result<Vec<RunRecord>, StoreError> {
        self.latest(None)
    }

    /// Latest run of every repository in `project`.
    pub fn get_latest_results_for_project(
        &self,
        project: &str,
    ) -> Result<Vec<RunRecord>, StoreError> {
        self.latest(Some(project))
    }

    fn latest(&self, project: Option<&str>) -> Result<Vec<RunRecord>, StoreError> {
        let (inner_where, outer_where, values) = match project {
            Some(p) => (
                " WHERE project = ?1",
                " WHERE r.project = ?1",
                vec![Value::Text(p.to_string())],
            ),
            None => ("", "", Vec::new()),
        };

        let sql = format!(
            r#"
            SELECT {columns}
            FROM pipeline_runs r
            JOIN (
                SELECT repository, MAX({inner_number}) AS max_run
                FROM pipeline_runs{inner_where}
                GROUP BY repository
            ) latest
              ON r.repository = latest.repository
             AND {outer_number} = latest.max_run{outer_where}
            ORDER BY r.repository, r.rowid
            "#,
            columns = qualified_columns("r"),
            inner_number = run_number("run_id"),
            outer_number = run_number("r.run_id"),
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_record)?;

        // Candidates tie on the number ("7" and "07", or every non-numeric id);
        // RunId ordering picks one per repository.
        let mut latest: Vec<RunRecord> = Vec::new();
        for row in rows {
            let record = row?;
            match latest.last_mut() {
                Some(prev) if prev.repository == record.repository => {
                    if record.run_id > prev.run_id {
                        *prev = record;
                    }
                }
                _ => latest.push(record),
            }
        }
        Ok(latest)
    }
}
