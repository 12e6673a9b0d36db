//! End-to-end: a scripted run source feeds the scheduler, the api reads back.

use async_trait::async_trait;
use runboard_core::{api, IngestionScheduler, QueryFacade, ResultStore, RunRecord, RunSource, RunStatus};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Returns one scripted history per call, then repeats the last one.
struct History(Mutex<Vec<Vec<RunRecord>>>);

#[async_trait]
impl RunSource for History {
    async fn fetch_all_run_records(&self, branch: &str) -> anyhow::Result<Vec<RunRecord>> {
        assert_eq!(branch, "develop");
        let mut pending = self.0.lock().unwrap();
        if pending.len() > 1 {
            Ok(pending.remove(0))
        } else {
            Ok(pending[0].clone())
        }
    }
}

fn failed(project: &str, repo: &str, run_id: &str, stage: &str) -> RunRecord {
    RunRecord::new(project, repo, run_id, RunStatus::Failed, 1_000)
        .with_failure(stage, Some("hudson.AbortException".into()), None)
}

#[tokio::test]
async fn test_ingested_runs_are_served_by_the_api() -> anyhow::Result<()> {
    let first = vec![
        failed("P1", "R1", "1", "run tests"),
        failed("P1", "R1", "2", "run tests"),
        failed("P1", "R1", "3", "deploy"),
        RunRecord::new("P2", "R2", "1", RunStatus::InProgress, 1_000),
    ];
    let mut second = first.clone();
    second[3] = failed("P2", "R2", "1", "deploy");

    let store = ResultStore::memory()?;
    let source = Arc::new(History(Mutex::new(vec![first, second])));
    let scheduler = IngestionScheduler::new(source, store.clone(), "develop");
    let facade = QueryFacade::new(store.clone());

    scheduler.run_once().await?;
    let before = api::route(&facade, "GET", "/heatmap/");
    assert_eq!(before.body["x"], json!(["(no stage)", "deploy", "run tests"]));

    let report = scheduler.run_once().await?.expect("cycle ran");
    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.unchanged, 3);

    let resp = api::route(&facade, "GET", "/heatmap/");
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.body,
        json!({
            "x": ["deploy", "run tests"],
            "y": ["P1", "P2"],
            "z": [[1, 2], [1, 0]]
        })
    );

    let latest = api::route(&facade, "GET", "/results/?latest=yes");
    let ids: Vec<&str> = latest.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["R13", "R21"]);
    Ok(())
}
