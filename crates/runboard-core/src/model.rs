//! Run record model shared by the store, the heatmap engine and the CI client.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Status label of a pipeline run as reported by the CI server.
///
/// Only `IN_PROGRESS` is mutable; every other label is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    InProgress,
    Success,
    Failed,
    /// CI-specific terminal label (`ABORTED`, `UNSTABLE`, `NOT_EXECUTED`, ...), kept verbatim.
    Other(String),
}

impl RunStatus {
    pub const IN_PROGRESS: &'static str = "IN_PROGRESS";
    pub const SUCCESS: &'static str = "SUCCESS";
    pub const FAILED: &'static str = "FAILED";

    pub fn parse(s: &str) -> Self {
        match s {
            Self::IN_PROGRESS => Self::InProgress,
            Self::SUCCESS => Self::Success,
            Self::FAILED => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => Self::IN_PROGRESS,
            Self::Success => Self::SUCCESS,
            Self::Failed => Self::FAILED,
            Self::Other(label) => label,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run identifier: a decimal integer carried as text.
///
/// Ordering is numeric (`"100" > "99"`). Identifiers that do not parse as an
/// integer sort before every numeric one; ties fall back to the text so that
/// `Ord` stays consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view of the identifier, if it is all ASCII digits.
    pub fn number(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl Ord for RunId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number()
            .cmp(&other.number())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for RunId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One pipeline execution attempt.
///
/// `success` is not a field: it is derived from [`RunStatus`] everywhere it is
/// observed (JSON, SQL rows, [`RunRecord::success`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RunRecordWire", into = "RunRecordWire")]
pub struct RunRecord {
    /// Primary key, conventionally `repository + run_id`.
    pub id: String,
    pub run_id: RunId,
    pub project: String,
    pub repository: String,
    pub status: RunStatus,
    /// Execution start, epoch milliseconds.
    pub timestamp: i64,
    /// First stage reported as `FAILED`.
    pub stage_failed: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl RunRecord {
    /// Build a record whose id is `repository + run_id`.
    pub fn new(
        project: impl Into<String>,
        repository: impl Into<String>,
        run_id: impl Into<RunId>,
        status: RunStatus,
        timestamp: i64,
    ) -> Self {
        let repository = repository.into();
        let run_id = run_id.into();
        Self {
            id: Self::compose_id(&repository, &run_id),
            run_id,
            project: project.into(),
            repository,
            status,
            timestamp,
            stage_failed: None,
            error_type: None,
            error_message: None,
        }
    }

    pub fn compose_id(repository: &str, run_id: &RunId) -> String {
        format!("{}{}", repository, run_id.as_str())
    }

    /// Attach the failing stage and its error details.
    pub fn with_failure(
        mut self,
        stage: impl Into<String>,
        error_type: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        self.stage_failed = Some(stage.into());
        self.error_type = error_type;
        self.error_message = error_message;
        self
    }

    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = status;
        self
    }

    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_in_progress(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// JSON shape of a record; `success` is written out and ignored on the way in.
#[derive(Clone, Serialize, Deserialize)]
struct RunRecordWire {
    id: String,
    run_id: RunId,
    project: String,
    repository: String,
    status: RunStatus,
    timestamp: i64,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stage_failed: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<RunRecordWire> for RunRecord {
    fn from(w: RunRecordWire) -> Self {
        Self {
            id: w.id,
            run_id: w.run_id,
            project: w.project,
            repository: w.repository,
            status: w.status,
            timestamp: w.timestamp,
            stage_failed: w.stage_failed,
            error_type: w.error_type,
            error_message: w.error_message,
        }
    }
}

impl From<RunRecord> for RunRecordWire {
    fn from(r: RunRecord) -> Self {
        let success = r.success();
        Self {
            id: r.id,
            run_id: r.run_id,
            project: r.project,
            repository: r.repository,
            status: r.status,
            timestamp: r.timestamp,
            success,
            stage_failed: r.stage_failed,
            error_type: r.error_type,
            error_message: r.error_message,
        }
    }
}
