//! Jenkins JSON API and workflow API (`wfapi`) response shapes.
//!
//! Every field is optional: Jenkins omits what it does not know and older
//! plugin versions differ in what they send.

use runboard_core::{RunRecord, RunStatus};
use serde::{Deserialize, Deserializer};

/// `_class` of a folder bound to a source control organization.
pub const ORGANIZATION_FOLDER_CLASS: &str = "jenkins.branch.OrganizationFolder";

/// `GET {url}/api/json` and `GET {url}/job/{folder}/api/json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(rename = "_class", default)]
    pub class: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Job {
    pub fn is_organization_folder(&self) -> bool {
        self.class.as_deref() == Some(ORGANIZATION_FOLDER_CLASS)
    }
}

/// One entry of `GET .../wfapi/runs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time_millis: Option<i64>,
    #[serde(default)]
    pub stages: Vec<WorkflowStage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowStage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<StageError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl WorkflowRun {
    /// Convert to a [`RunRecord`] for `project`/`repository`.
    ///
    /// `None` when the run has no id or no status. For unsuccessful runs the
    /// first stage reported `FAILED` supplies the failure details.
    pub fn to_record(&self, project: &str, repository: &str) -> Option<RunRecord> {
        let id = self.id.as_deref()?;
        let status = RunStatus::parse(self.status.as_deref()?);

        let mut record = RunRecord::new(
            project,
            repository,
            id,
            status,
            self.start_time_millis.unwrap_or(0),
        );

        if !record.success() {
            if let Some(stage) = self
                .stages
                .iter()
                .find(|s| s.status.as_deref() == Some(RunStatus::FAILED))
            {
                let (kind, message) = match &stage.error {
                    Some(e) => (e.kind.clone(), e.message.clone()),
                    None => (None, None),
                };
                record.stage_failed = stage.name.clone();
                record.error_type = kind;
                record.error_message = message;
            }
        }

        Some(record)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_successful_run() {
        let run: WorkflowRun = serde_json::from_value(json!({
            "id": "7",
            "name": "#7",
            "status": "SUCCESS",
            "startTimeMillis": 1491143071036_i64,
            "stages": [{"name": "Setup", "status": "SUCCESS"}]
        }))
        .unwrap();

        let record = run.to_record("TEST", "jenkinsfile-test").unwrap();
        assert_eq!(record.id, "jenkinsfile-test7");
        assert_eq!(record.timestamp, 1491143071036);
        assert!(record.success());
        assert!(record.stage_failed.is_none());
    }

    #[test]
    fn test_failed_run_takes_first_failed_stage() {
        let run: WorkflowRun = serde_json::from_value(json!({
            "id": "6",
            "status": "FAILED",
            "startTimeMillis": 1491143013685_i64,
            "stages": [
                {"name": "Checkout", "status": "SUCCESS"},
                {"name": "Setup", "status": "FAILED",
                 "error": {"message": "Oops.", "type": "hudson.AbortException"}},
                {"name": "Deploy", "status": "FAILED"}
            ]
        }))
        .unwrap();

        let record = run.to_record("TEST", "jenkinsfile-test").unwrap();
        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.stage_failed.as_deref(), Some("Setup"));
        assert_eq!(record.error_type.as_deref(), Some("hudson.AbortException"));
        assert_eq!(record.error_message.as_deref(), Some("Oops."));
    }

    #[test]
    fn test_failed_stage_without_error_object() {
        let run: WorkflowRun = serde_json::from_value(json!({
            "id": 12,
            "status": "ABORTED",
            "stages": [{"name": "Build", "status": "FAILED"}]
        }))
        .unwrap();

        let record = run.to_record("P", "r").unwrap();
        assert_eq!(record.run_id.as_str(), "12");
        assert_eq!(record.timestamp, 0);
        assert_eq!(record.status.as_str(), "ABORTED");
        assert_eq!(record.stage_failed.as_deref(), Some("Build"));
        assert!(record.error_type.is_none());
    }

    #[test]
    fn test_in_progress_run_has_no_failed_stage() {
        let run: WorkflowRun = serde_json::from_value(json!({
            "id": "8",
            "status": "IN_PROGRESS",
            "stages": [{"name": "Setup", "status": "IN_PROGRESS"}]
        }))
        .unwrap();
        let record = run.to_record("P", "r").unwrap();
        assert!(record.is_in_progress());
        assert!(record.stage_failed.is_none());
    }

    #[test]
    fn test_runs_missing_id_or_status_are_skipped() {
        let no_id: WorkflowRun = serde_json::from_value(json!({"status": "SUCCESS"})).unwrap();
        assert!(no_id.to_record("P", "r").is_none());

        let no_status: WorkflowRun = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert!(no_status.to_record("P", "r").is_none());
    }

    #[test]
    fn test_job_list_folder_class() {
        let list: JobList = serde_json::from_value(json!({
            "jobs": [
                {"_class": ORGANIZATION_FOLDER_CLASS, "name": "TEST"},
                {"_class": "hudson.model.FreeStyleProject", "name": "legacy"}
            ]
        }))
        .unwrap();
        let folders: Vec<_> = list.jobs.iter().filter(|j| j.is_organization_folder()).collect();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name.as_deref(), Some("TEST"));

        let empty: JobList = serde_json::from_value(json!({})).unwrap();
        assert!(empty.jobs.is_empty());
    }
}
