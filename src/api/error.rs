use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Response has no {expected}: {body}")]
    UnexpectedResponse { expected: &'static str, body: String },
    #[error("Can't encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Can't open {}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },
}

impl ApiError {
    /// The raw response body, when the server sent one
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } | ApiError::UnexpectedResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}
