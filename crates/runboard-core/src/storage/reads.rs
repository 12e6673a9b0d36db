//! Read paths: point lookup, filtered listings, distinct projections.

use super::rows::{row_to_record, RUN_COLUMNS};
use super::store::{ResultStore, StoreError};
use crate::model::RunRecord;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};
use std::collections::BTreeSet;

/// Conjunction of `column = ?` / `timestamp <= ?` predicates.
#[derive(Default)]
struct RunFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl RunFilter {
    fn eq(mut self, column: &str, value: &str) -> Self {
        self.values.push(Value::Text(value.to_string()));
        self.clauses.push(format!("{} = ?{}", column, self.values.len()));
        self
    }

    fn failed(mut self) -> Self {
        self.clauses.push("success = 0".to_string());
        self
    }

    fn before(mut self, cutoff: Option<i64>) -> Self {
        if let Some(ts) = cutoff {
            self.values.push(Value::Integer(ts));
            self.clauses
                .push(format!("timestamp <= ?{}", self.values.len()));
        }
        self
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

impl ResultStore {
    fn select(&self, filter: RunFilter) -> Result<Vec<RunRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM pipeline_runs{} ORDER BY rowid",
            RUN_COLUMNS,
            filter.where_clause()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.values.iter()), row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn distinct(&self, column: &str, filter: RunFilter) -> Result<BTreeSet<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT {} FROM pipeline_runs{}",
            column,
            filter.where_clause()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(filter.values.iter()), |row| row.get(0))?;
        let values = rows.collect::<Result<BTreeSet<String>, _>>()?;
        Ok(values)
    }

    /// Point lookup by primary key (`repository + run_id`).
    pub fn get_by_id(&self, id: &str) -> Result<Option<RunRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM pipeline_runs WHERE id = ?1", RUN_COLUMNS);
        Ok(conn.query_row(&sql, [id], row_to_record).optional()?)
    }

    /// All runs, optionally only those started at or before `before` (epoch ms).
    pub fn get_all(&self, before: Option<i64>) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().before(before))
    }

    pub fn get_for_project(
        &self,
        project: &str,
        before: Option<i64>,
    ) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().eq("project", project).before(before))
    }

    pub fn get_for_repo(
        &self,
        repository: &str,
        before: Option<i64>,
    ) -> Result<Vec<RunRecord>, StoreError> {
        self.select(
            RunFilter::default()
                .eq("repository", repository)
                .before(before),
        )
    }

    /// Every run that did not succeed (in-progress runs included).
    pub fn get_failures(&self) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().failed())
    }

    pub fn get_failures_for_project(&self, project: &str) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().eq("project", project).failed())
    }

    pub fn get_failures_for_repo(&self, repository: &str) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().eq("repository", repository).failed())
    }

    /// Runs that failed at the named stage.
    pub fn get_failures_for_stage(&self, stage: &str) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().eq("stage_failed", stage))
    }

    /// Runs that failed with the given CI error type (e.g. `hudson.AbortException`).
    pub fn get_failures_by_error_type(
        &self,
        error_type: &str,
    ) -> Result<Vec<RunRecord>, StoreError> {
        self.select(RunFilter::default().eq("error_type", error_type))
    }

    pub fn get_projects(&self) -> Result<BTreeSet<String>, StoreError> {
        self.distinct("project", RunFilter::default())
    }

    pub fn get_repos_for_project(&self, project: &str) -> Result<BTreeSet<String>, StoreError> {
        self.distinct("repository", RunFilter::default().eq("project", project))
    }

    pub fn check_project_exists(&self, project: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pipeline_runs WHERE project = ?1)",
            [project],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    const DAY_MS: i64 = 86_400_000;
    const WEEK_MS: i64 = 7 * DAY_MS;
    const T: i64 = 1_700_000_000_000;

    fn seeded() -> ResultStore {
        let store = ResultStore::memory().unwrap();
        store
            .upsert_batch(&[
                RunRecord::new("TEST", "jenkinsfile-test", "5", RunStatus::Failed, T - 2 * WEEK_MS)
                    .with_failure("Deploy", Some("hudson.AbortException".into()), None),
                RunRecord::new("TEST", "jenkinsfile-test", "6", RunStatus::Failed, T - DAY_MS)
                    .with_failure("Setup", Some("hudson.AbortException".into()), None),
                RunRecord::new("TEST", "jenkinsfile-test", "7", RunStatus::Success, T),
                RunRecord::new("OTHER", "service-a", "1", RunStatus::Failed, T)
                    .with_failure("Setup", Some("java.io.IOException".into()), None),
                RunRecord::new("OTHER", "service-b", "3", RunStatus::InProgress, T),
            ])
            .unwrap();
        store
    }

    fn ids(records: &[RunRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_get_by_id_missing_is_none() {
        let store = seeded();
        assert!(store.get_by_id("nope1").unwrap().is_none());
    }

    #[test]
    fn test_get_all_in_insertion_order() {
        let store = seeded();
        assert_eq!(
            ids(&store.get_all(None).unwrap()),
            vec![
                "jenkinsfile-test5",
                "jenkinsfile-test6",
                "jenkinsfile-test7",
                "service-a1",
                "service-b3"
            ]
        );
    }

    #[test]
    fn test_before_timestamp_is_inclusive() {
        let store = seeded();
        let recs = store.get_for_repo("jenkinsfile-test", Some(T - WEEK_MS)).unwrap();
        assert_eq!(ids(&recs), vec!["jenkinsfile-test5"]);

        let recs = store.get_for_repo("jenkinsfile-test", Some(T - DAY_MS)).unwrap();
        assert_eq!(ids(&recs), vec!["jenkinsfile-test5", "jenkinsfile-test6"]);

        assert_eq!(store.get_all(Some(T - WEEK_MS)).unwrap().len(), 1);
        assert_eq!(store.get_for_project("OTHER", Some(T - 1)).unwrap().len(), 0);
    }

    #[test]
    fn test_project_and_repo_filters() {
        let store = seeded();
        assert_eq!(store.get_for_project("TEST", None).unwrap().len(), 3);
        assert_eq!(store.get_for_project("OTHER", None).unwrap().len(), 2);
        assert_eq!(ids(&store.get_for_repo("service-a", None).unwrap()), vec!["service-a1"]);
        assert!(store.get_for_repo("missing", None).unwrap().is_empty());
    }

    #[test]
    fn test_failure_filters() {
        let store = seeded();
        assert_eq!(
            ids(&store.get_failures().unwrap()),
            vec!["jenkinsfile-test5", "jenkinsfile-test6", "service-a1", "service-b3"]
        );
        assert_eq!(store.get_failures_for_project("TEST").unwrap().len(), 2);
        assert_eq!(store.get_failures_for_repo("service-a").unwrap().len(), 1);
        assert!(store.get_failures_for_repo("jenkinsfile-test").unwrap().iter().all(|r| !r.success()));
    }

    #[test]
    fn test_failures_by_stage_and_error_type() {
        let store = seeded();
        assert_eq!(
            ids(&store.get_failures_for_stage("Setup").unwrap()),
            vec!["jenkinsfile-test6", "service-a1"]
        );
        assert_eq!(
            ids(&store.get_failures_by_error_type("hudson.AbortException").unwrap()),
            vec!["jenkinsfile-test5", "jenkinsfile-test6"]
        );
    }

    #[test]
    fn test_distinct_projections() {
        let store = seeded();
        let projects: Vec<String> = store.get_projects().unwrap().into_iter().collect();
        assert_eq!(projects, vec!["OTHER", "TEST"]);

        let repos: Vec<String> = store
            .get_repos_for_project("OTHER")
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(repos, vec!["service-a", "service-b"]);
        assert!(store.get_repos_for_project("FAKENEWS").unwrap().is_empty());
    }

    #[test]
    fn test_check_project_exists() {
        let store = seeded();
        assert!(store.check_project_exists("TEST").unwrap());
        assert!(!store.check_project_exists("FAKENEWS").unwrap());
    }
}
