//! Sink client error types.

use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid sink configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SinkError {
    /// HTTP status returned by the sink, if the request got that far.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SinkError::RequestFailed { status, .. } => Some(*status),
            SinkError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
