use std::sync::Arc;

/// Failure of a call to the catalog or collection service.
///
/// Cloneable so it can be carried inside UI messages.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },

    #[error("invalid endpoint: {0}")]
    Url(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(Arc::new(e))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),

    #[error("Invalid url {0}: {1}")]
    InvalidUrl(String, String),
}

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
