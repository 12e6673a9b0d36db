//! Read-side facade: request-level filters over [`ResultStore`].

use crate::heatmap::{build_heatmap, GroupBy, Matrix};
use crate::model::RunRecord;
use crate::storage::{ResultStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// One week in milliseconds.
pub const WEEK_MS: i64 = 604_800_000;

/// Query errors.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: NotFoundKind, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }

    fn project(name: &str) -> Self {
        QueryError::NotFound {
            kind: NotFoundKind::Project,
            name: name.to_string(),
        }
    }

    fn repository(name: &str) -> Self {
        QueryError::NotFound {
            kind: NotFoundKind::Repository,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Project,
    Repository,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Project => f.write_str("project"),
            NotFoundKind::Repository => f.write_str("repository"),
        }
    }
}

/// Filters for [`QueryFacade::results`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsQuery {
    pub project: Option<String>,
    pub repo: Option<String>,
    /// Only the latest run of each repository.
    #[serde(default)]
    pub latest: bool,
    /// Only runs started at least this many weeks ago; 0 disables the cutoff.
    pub weeks_ago: Option<u32>,
}

impl ResultsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_weeks_ago(mut self, weeks: u32) -> Self {
        self.weeks_ago = Some(weeks);
        self
    }
}

/// Inclusive timestamp cutoff `weeks` before `now_ms`; `None` for 0 or absent.
pub fn weeks_ago_cutoff(now_ms: i64, weeks: Option<u32>) -> Option<i64> {
    match weeks {
        None | Some(0) => None,
        Some(w) => Some(now_ms.saturating_sub(i64::from(w).saturating_mul(WEEK_MS))),
    }
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Read-side composition over a [`ResultStore`].
#[derive(Clone)]
pub struct QueryFacade {
    store: ResultStore,
    clock: Clock,
}

impl QueryFacade {
    pub fn new(store: ResultStore) -> Self {
        Self {
            store,
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Replace the wall clock (epoch milliseconds) used for `weeks_ago`.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn ensure_project(&self, project: &str) -> Result<(), QueryError> {
        if self.store.check_project_exists(project)? {
            Ok(())
        } else {
            Err(QueryError::project(project))
        }
    }

    pub fn results(&self, query: &ResultsQuery) -> Result<Vec<RunRecord>, QueryError> {
        let project = query.project.as_deref();
        let repo = query.repo.as_deref();

        if let Some(p) = project {
            self.ensure_project(p)?;
            if let Some(r) = repo {
                if !self.store.get_repos_for_project(p)?.contains(r) {
                    return Err(QueryError::repository(r));
                }
            }
        }

        let cutoff = weeks_ago_cutoff((self.clock)(), query.weeks_ago);
        debug!(?project, ?repo, latest = query.latest, ?cutoff, "results query");

        let records = if query.latest {
            let latest = match project {
                Some(p) => self.store.get_latest_results_for_project(p)?,
                None => self.store.get_latest_results()?,
            };
            latest
                .into_iter()
                .filter(|r| repo.map_or(true, |name| r.repository == name))
                .filter(|r| cutoff.map_or(true, |ts| r.timestamp <= ts))
                .collect()
        } else if let Some(r) = repo {
            self.store.get_for_repo(r, cutoff)?
        } else if let Some(p) = project {
            self.store.get_for_project(p, cutoff)?
        } else {
            self.store.get_all(cutoff)?
        };

        Ok(records)
    }

    /// Failure heatmap. With a project: that project's repositories on `y`;
    /// otherwise all projects.
    pub fn heatmap(&self, project: Option<&str>) -> Result<Matrix, QueryError> {
        let matrix = match project {
            Some(p) => {
                self.ensure_project(p)?;
                build_heatmap(&self.store.get_failures_for_project(p)?, GroupBy::Repository)
            }
            None => build_heatmap(&self.store.get_failures()?, GroupBy::Project),
        };
        Ok(matrix)
    }

    pub fn projects(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.store.get_projects()?.into_iter().collect())
    }

    pub fn repositories(&self, project: &str) -> Result<Vec<String>, QueryError> {
        self.ensure_project(project)?;
        Ok(self.store.get_repos_for_project(project)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    const DAY_MS: i64 = 86_400_000;
    const T: i64 = 1_700_000_000_000;

    fn facade() -> QueryFacade {
        let store = ResultStore::memory().unwrap();
        store
            .upsert_batch(&[
                RunRecord::new("TEST", "jenkinsfile-test", "5", RunStatus::Failed, T - 2 * WEEK_MS)
                    .with_failure("Deploy", None, None),
                RunRecord::new("TEST", "jenkinsfile-test", "6", RunStatus::Failed, T - DAY_MS)
                    .with_failure("Setup", None, None),
                RunRecord::new("TEST", "jenkinsfile-test", "7", RunStatus::Success, T),
                RunRecord::new("TEST", "other-repo", "1", RunStatus::Failed, T)
                    .with_failure("Setup", None, None),
                RunRecord::new("OTHER", "service-a", "100", RunStatus::Failed, T)
                    .with_failure("Build", None, None),
                RunRecord::new("OTHER", "service-a", "99", RunStatus::Success, T - 3 * WEEK_MS),
            ])
            .unwrap();
        QueryFacade::new(store).with_clock(|| T)
    }

    fn ids(records: &[RunRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_weeks_ago_cutoff() {
        assert_eq!(weeks_ago_cutoff(T, None), None);
        assert_eq!(weeks_ago_cutoff(T, Some(0)), None);
        assert_eq!(weeks_ago_cutoff(T, Some(1)), Some(T - WEEK_MS));
        assert_eq!(weeks_ago_cutoff(T, Some(3)), Some(T - 3 * WEEK_MS));
    }

    #[test]
    fn test_results_weeks_ago_filters_by_cutoff() {
        let f = facade();
        let q = ResultsQuery::new().with_repo("jenkinsfile-test").with_weeks_ago(1);
        assert_eq!(ids(&f.results(&q).unwrap()), vec!["jenkinsfile-test5"]);
    }

    #[test]
    fn test_results_unfiltered_and_by_project() {
        let f = facade();
        assert_eq!(f.results(&ResultsQuery::new()).unwrap().len(), 6);
        assert_eq!(
            f.results(&ResultsQuery::new().with_project("OTHER")).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_results_unknown_project_is_not_found() {
        let f = facade();
        let err = f
            .results(&ResultsQuery::new().with_project("FAKENEWS"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "project not found: FAKENEWS");
    }

    #[test]
    fn test_results_repo_outside_project_is_not_found() {
        let f = facade();
        let err = f
            .results(&ResultsQuery::new().with_project("OTHER").with_repo("other-repo"))
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::NotFound {
                kind: NotFoundKind::Repository,
                ..
            }
        ));
    }

    #[test]
    fn test_results_latest() {
        let f = facade();
        let all = f.results(&ResultsQuery::new().latest(true)).unwrap();
        assert_eq!(
            ids(&all),
            vec!["jenkinsfile-test7", "other-repo1", "service-a100"]
        );

        let scoped = f
            .results(&ResultsQuery::new().with_project("TEST").with_repo("jenkinsfile-test").latest(true))
            .unwrap();
        assert_eq!(ids(&scoped), vec!["jenkinsfile-test7"]);

        // Latest runs are all at T; a one week cutoff drops them
        let old = f
            .results(&ResultsQuery::new().latest(true).with_weeks_ago(1))
            .unwrap();
        assert!(old.is_empty());
    }

    #[test]
    fn test_heatmap_global_groups_by_project() {
        let m = facade().heatmap(None).unwrap();
        assert_eq!(m.x, vec!["Build", "Deploy", "Setup"]);
        assert_eq!(m.y, vec!["OTHER", "TEST"]);
        assert_eq!(m.total(), 4);
    }

    #[test]
    fn test_heatmap_for_project_groups_by_repository() {
        let f = facade();
        let m = f.heatmap(Some("TEST")).unwrap();
        assert_eq!(m.x, vec!["Deploy", "Setup"]);
        assert_eq!(m.y, vec!["jenkinsfile-test", "other-repo"]);
        assert_eq!(m.z, vec![vec![1, 1], vec![0, 1]]);

        assert!(f.heatmap(Some("FAKENEWS")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_projects_and_repositories() {
        let f = facade();
        assert_eq!(f.projects().unwrap(), vec!["OTHER", "TEST"]);
        assert_eq!(
            f.repositories("TEST").unwrap(),
            vec!["jenkinsfile-test", "other-repo"]
        );
        assert!(f.repositories("FAKENEWS").unwrap_err().is_not_found());
    }
}
