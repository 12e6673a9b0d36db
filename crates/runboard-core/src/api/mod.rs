//! Read-side request handling.
//!
//! Transport-agnostic: handlers take a [`QueryFacade`] and return an
//! [`ApiResponse`] (status, headers, JSON body) that any HTTP server, or the
//! CLI, can write out as-is.
//!
//! | Route | Body |
//! |-------|------|
//! | `GET /results/?project=&repo=&latest=&weeks_ago=` | `{"results": [...]}` |
//! | `GET /results/{project}[/{repo}]` | `{"results": [...]}` |
//! | `GET /heatmap/?project=`, `GET /heatmap/{project}` | `{"x": [...], "y": [...], "z": [[...]]}` |
//! | `GET /projects/` | `{"projects": [...]}` |
//! | `GET /projects/{project}` | `{"repositories": [...]}` |

mod router;

pub use router::route;

use crate::query::{QueryError, QueryFacade, ResultsQuery};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

pub const CORS_HEADER: (&str, &str) = ("Access-Control-Allow-Origin", "*");

/// A rendered response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![
                (CORS_HEADER.0.to_string(), CORS_HEADER.1.to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::json(status, json!({ "error": message }))
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<QueryError> for ApiResponse {
    fn from(err: QueryError) -> Self {
        if err.is_not_found() {
            return ApiResponse::error(404, err.to_string());
        }
        error!(error = %err, "query failed");
        ApiResponse::error(500, "internal error")
    }
}

/// `{"results": [...]}`
pub fn results(facade: &QueryFacade, query: &ResultsQuery) -> ApiResponse {
    match facade.results(query) {
        Ok(records) => ApiResponse::ok(json!({ "results": records })),
        Err(e) => e.into(),
    }
}

/// `{"x": [...], "y": [...], "z": [[...]]}`
pub fn heatmap(facade: &QueryFacade, project: Option<&str>) -> ApiResponse {
    match facade.heatmap(project) {
        Ok(matrix) => ApiResponse::ok(json!(matrix)),
        Err(e) => e.into(),
    }
}

/// `{"projects": [...]}`
pub fn projects(facade: &QueryFacade) -> ApiResponse {
    match facade.projects() {
        Ok(names) => ApiResponse::ok(json!({ "projects": names })),
        Err(e) => e.into(),
    }
}

/// `{"repositories": [...]}`
pub fn project(facade: &QueryFacade, name: &str) -> ApiResponse {
    match facade.repositories(name) {
        Ok(names) => ApiResponse::ok(json!({ "repositories": names })),
        Err(e) => e.into(),
    }
}
