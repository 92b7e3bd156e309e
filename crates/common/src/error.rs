use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Summarization failed: {0}")]
    Summarize(String),

    /// The remote side is temporarily unable to answer, optionally saying for how long.
    #[error("Service unavailable: {message}")]
    Unavailable {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DigestError {
    /// How long the remote side asked us to wait before trying again.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DigestError::Unavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type DigestResult<T> = Result<T, DigestError>;
