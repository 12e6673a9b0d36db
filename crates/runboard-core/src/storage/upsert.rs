use super::store::{ResultStore, StoreError};
use crate::model::{RunRecord, RunStatus};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use serde::Serialize;
use tracing::debug;

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No row with this id existed.
    Inserted,
    /// The stored row was `IN_PROGRESS` and has been overwritten.
    Updated,
    /// The stored row is terminal and was left alone.
    Unchanged,
}

/// Per-outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

// Insert-or-overwrite in one statement. The WHERE on DO UPDATE keeps terminal
// rows frozen even when another connection writes concurrently.
const UPSERT_SQL: &str = r#"
    INSERT INTO pipeline_runs (
        id, run_id, project, repository, status, timestamp,
        success, stage_failed, error_type, error_message
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(id) DO UPDATE SET
        run_id = excluded.run_id,
        project = excluded.project,
        repository = excluded.repository,
        status = excluded.status,
        timestamp = excluded.timestamp,
        success = excluded.success,
        stage_failed = excluded.stage_failed,
        error_type = excluded.error_type,
        error_message = excluded.error_message
    WHERE pipeline_runs.status = 'IN_PROGRESS'
"#;

fn upsert_in_txn(tx: &Transaction<'_>, record: &RunRecord) -> Result<UpsertOutcome, StoreError> {
    let stored: Option<String> = tx
        .query_row(
            "SELECT status FROM pipeline_runs WHERE id = ?1",
            [&record.id],
            |row| row.get(0),
        )
        .optional()?;

    let outcome = match stored.as_deref() {
        None => UpsertOutcome::Inserted,
        Some(RunStatus::IN_PROGRESS) => UpsertOutcome::Updated,
        Some(_) => UpsertOutcome::Unchanged,
    };

    if outcome == UpsertOutcome::Unchanged {
        return Ok(outcome);
    }

    tx.execute(
        UPSERT_SQL,
        params![
            record.id,
            record.run_id.as_str(),
            record.project,
            record.repository,
            record.status.as_str(),
            record.timestamp,
            record.success(),
            record.stage_failed,
            record.error_type,
            record.error_message,
        ],
    )?;

    Ok(outcome)
}

impl ResultStore {
    /// Insert a run, or overwrite the stored run while it is still `IN_PROGRESS`.
    pub fn upsert_one(&self, record: &RunRecord) -> Result<UpsertOutcome, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = upsert_in_txn(&tx, record)?;
        tx.commit()?;

        debug!(id = %record.id, status = %record.status, ?outcome, "upserted run");
        Ok(outcome)
    }

    /// Apply [`ResultStore::upsert_one`] to every record, in order, in one transaction.
    ///
    /// Later records see the effect of earlier ones. On error nothing is written.
    pub fn upsert_batch(&self, records: &[RunRecord]) -> Result<BatchSummary, StoreError> {
        let mut summary = BatchSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for record in records {
            // Rollback happens via Drop if we bail out here
            summary.record(upsert_in_txn(&tx, record)?);
        }
        tx.commit()?;

        debug!(
            batch_size = records.len(),
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "committed run batch"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    fn successful() -> RunRecord {
        RunRecord::new("TEST", "jenkinsfile-test", "7", RunStatus::Success, 1491143071036)
    }

    fn failed() -> RunRecord {
        RunRecord::new("TEST", "jenkinsfile-test", "6", RunStatus::Failed, 1491143013685)
            .with_failure(
                "Setup",
                Some("hudson.AbortException".into()),
                Some("Oops.".into()),
            )
    }

    fn in_progress() -> RunRecord {
        RunRecord::new("TEST", "jenkinsfile-test", "8", RunStatus::InProgress, 1491143071136)
    }

    #[test]
    fn test_insert_successful_result_and_retrieve() {
        let store = ResultStore::memory().unwrap();
        assert_eq!(
            store.upsert_one(&successful()).unwrap(),
            UpsertOutcome::Inserted
        );
        let got = store.get_by_id("jenkinsfile-test7").unwrap().unwrap();
        assert_eq!(got, successful());
        assert!(got.success());
    }

    #[test]
    fn test_insert_failed_result_and_retrieve() {
        let store = ResultStore::memory().unwrap();
        store.upsert_one(&failed()).unwrap();
        let got = store.get_by_id("jenkinsfile-test6").unwrap().unwrap();
        assert_eq!(got, failed());
        assert_eq!(got.error_message.as_deref(), Some("Oops."));
    }

    #[test]
    fn test_terminal_upsert_is_idempotent() {
        let store = ResultStore::memory().unwrap();
        store.upsert_one(&failed()).unwrap();
        let before = store.get_by_id("jenkinsfile-test6").unwrap();

        assert_eq!(
            store.upsert_one(&failed()).unwrap(),
            UpsertOutcome::Unchanged
        );
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get_by_id("jenkinsfile-test6").unwrap(), before);
    }

    #[test]
    fn test_terminal_row_is_never_overwritten() {
        let store = ResultStore::memory().unwrap();
        store.upsert_one(&successful()).unwrap();

        // A stale report that still claims the run is in flight
        let stale = successful().with_status(RunStatus::InProgress);
        assert_eq!(store.upsert_one(&stale).unwrap(), UpsertOutcome::Unchanged);

        let mut rewritten = successful().with_status(RunStatus::Failed);
        rewritten.timestamp = 1;
        store.upsert_one(&rewritten).unwrap();

        assert_eq!(store.get_by_id("jenkinsfile-test7").unwrap(), Some(successful()));
    }

    #[test]
    fn test_in_progress_row_converges_to_terminal() {
        let store = ResultStore::memory().unwrap();
        store.upsert_one(&in_progress()).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        // Still running, new timestamp: overwritten in place
        let mut still_running = in_progress();
        still_running.timestamp += 5;
        assert_eq!(
            store.upsert_one(&still_running).unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(store.count().unwrap(), 1);

        let finished = in_progress().with_status(RunStatus::Success);
        assert_eq!(store.upsert_one(&finished).unwrap(), UpsertOutcome::Updated);
        assert_eq!(store.count().unwrap(), 1);

        let got = store.get_by_id("jenkinsfile-test8").unwrap().unwrap();
        assert_eq!(got, finished);
        assert!(got.success());
    }

    #[test]
    fn test_batch_insert_and_retrieve() {
        let store = ResultStore::memory().unwrap();
        let summary = store.upsert_batch(&[successful(), failed()]).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(store.get_by_id("jenkinsfile-test7").unwrap(), Some(successful()));
        assert_eq!(store.get_by_id("jenkinsfile-test6").unwrap(), Some(failed()));
    }

    #[test]
    fn test_batch_with_a_single_update() {
        let store = ResultStore::memory().unwrap();
        store
            .upsert_batch(&[successful(), failed(), in_progress()])
            .unwrap();

        let finished = in_progress().with_status(RunStatus::Success);
        let summary = store
            .upsert_batch(&[successful(), failed(), finished.clone()])
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                inserted: 0,
                updated: 1,
                unchanged: 2
            }
        );
        assert_eq!(store.get_by_id(&finished.id).unwrap(), Some(finished));
    }

    #[test]
    fn test_batch_later_records_observe_earlier_ones() {
        let store = ResultStore::memory().unwrap();
        let finished = in_progress().with_status(RunStatus::Failed);
        let reopened = in_progress();

        let summary = store
            .upsert_batch(&[in_progress(), finished.clone(), reopened])
            .unwrap();

        // insert, overwrite while IN_PROGRESS, then frozen
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(store.get_by_id(&finished.id).unwrap(), Some(finished));
    }

    #[test]
    fn test_batch_rolls_back_as_a_unit() {
        let store = ResultStore::memory().unwrap();
        store.upsert_one(&in_progress()).unwrap();

        let mut broken = failed();
        broken.id = String::new();
        let finished = in_progress().with_status(RunStatus::Success);

        let result = store.upsert_batch(&[successful(), finished, broken]);
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get_by_id("jenkinsfile-test7").unwrap().is_none());
        assert_eq!(
            store.get_by_id("jenkinsfile-test8").unwrap(),
            Some(in_progress())
        );
    }

    #[test]
    fn test_empty_batch_is_a_noop() {
        let store = ResultStore::memory().unwrap();
        assert_eq!(store.upsert_batch(&[]).unwrap(), BatchSummary::default());
        assert_eq!(store.count().unwrap(), 0);
    }
}
