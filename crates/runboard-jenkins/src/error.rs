//! Error types for the Jenkins client.

/// Jenkins client errors.
#[derive(Debug, thiserror::Error)]
pub enum JenkinsError {
    /// Bad URL or credentials; fatal at startup.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Transport failure (connect, timeout, body read).
    #[error("network error: {message}")]
    Network { message: String },

    /// Response we could not make sense of.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl JenkinsError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error is a configuration problem rather than a runtime one.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<reqwest::Error> for JenkinsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for Jenkins operations.
pub type JenkinsResult<T> = Result<T, JenkinsError>;
