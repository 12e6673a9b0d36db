//! HTTP layer: status mapping and body decoding.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Endpoint;
use crate::error::{JenkinsError, JenkinsResult};

/// HTTP backend (holds reqwest client and the validated endpoint).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: Endpoint,
}

impl HttpBackend {
    /// GET `url` and decode the JSON body.
    ///
    /// - 404: `Ok(None)`; many repositories simply have no history on the branch
    /// - other non-2xx or a body that is not the expected JSON: logged, `Ok(None)`
    /// - transport failure: `Err(Network)`
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> JenkinsResult<Option<T>> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.endpoint.username, Some(&self.endpoint.password))
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "not found, treating as empty");
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| JenkinsError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "unexpected status, skipping");
            return Ok(None);
        }

        match decode(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(url = %url, error = %e, "skipping unreadable response");
                Ok(None)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> JenkinsResult<T> {
    serde_json::from_str(body).map_err(|e| JenkinsError::InvalidResponse {
        message: format!("expected JSON ({}): {}", e, snippet(body)),
    })
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > 80 {
        format!("{}...", trimmed.chars().take(80).collect::<String>())
    } else {
        trimmed.to_string()
    }
}
