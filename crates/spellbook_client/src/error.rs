//! Client-side error type.

use thiserror::Error;

/// Failures surfaced by the API client and the sync orchestrator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connect, timeout, decode).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// HTTP status for [`ClientError::Api`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
