//! Failure heatmap: stage x (project | repository) counts.
//!
//! Pure transform over [`RunRecord`]s; no I/O. The output is the `(x, y, z)`
//! triple a plotting front end consumes directly:
//!
//! - `x`: failing stage names, ascending
//! - `y`: project or repository names, in first-seen order while walking `x`
//! - `z`: one row per `y` entry, one column per `x` entry

use crate::model::RunRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stage label for runs that failed without any stage reporting `FAILED`.
pub const UNATTRIBUTED_STAGE: &str = "(no stage)";

/// Inner dimension of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Project,
    Repository,
}

impl GroupBy {
    pub fn key_of<'a>(&self, record: &'a RunRecord) -> &'a str {
        match self {
            GroupBy::Project => &record.project,
            GroupBy::Repository => &record.repository,
        }
    }
}

/// Heatmap data: `z.len() == y.len()` and every row has `x.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<u64>>,
}

impl Matrix {
    /// Count at (`stage`, `key`), 0 when either is absent.
    pub fn get(&self, stage: &str, key: &str) -> u64 {
        let (Some(i), Some(j)) = (
            self.x.iter().position(|s| s == stage),
            self.y.iter().position(|k| k == key),
        ) else {
            return 0;
        };
        self.z[j][i]
    }

    /// Sum of all cells.
    pub fn total(&self) -> u64 {
        self.z.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Build the failure matrix for `records` along `group_by`.
///
/// Records are stable-sorted by failing stage (missing stage first, labelled
/// [`UNATTRIBUTED_STAGE`]), so identical input yields identical output. Every
/// record lands in exactly one cell.
pub fn build_heatmap(records: &[RunRecord], group_by: GroupBy) -> Matrix {
    let mut ordered: Vec<(&str, &RunRecord)> = records
        .iter()
        .map(|r| (stage_label(r), r))
        .collect();
    // Unattributed first, then ascending; a literal "(no stage)" stage joins that group.
    ordered.sort_by_key(|(stage, _)| (*stage != UNATTRIBUTED_STAGE, *stage));

    let mut x: Vec<String> = Vec::new();
    let mut y: Vec<String> = Vec::new();
    let mut y_index: HashMap<&str, usize> = HashMap::new();
    // (stage column, key row) -> repository -> failures
    let mut tallies: HashMap<(usize, usize), HashMap<&str, u64>> = HashMap::new();

    for (stage, record) in ordered {
        if x.last().map(String::as_str) != Some(stage) {
            x.push(stage.to_string());
        }
        let col = x.len() - 1;

        let key = group_by.key_of(record);
        let row = *y_index.entry(key).or_insert_with(|| {
            y.push(key.to_string());
            y.len() - 1
        });

        *tallies
            .entry((col, row))
            .or_default()
            .entry(record.repository.as_str())
            .or_insert(0) += 1;
    }

    let mut z = vec![vec![0u64; x.len()]; y.len()];
    for ((col, row), per_repo) in tallies {
        z[row][col] = per_repo.values().sum();
    }

    Matrix { x, y, z }
}

fn stage_label(record: &RunRecord) -> &str {
    record.stage_failed.as_deref().unwrap_or(UNATTRIBUTED_STAGE)
}
