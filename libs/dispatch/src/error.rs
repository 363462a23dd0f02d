use nomios_core::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid trigger manager url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to reach trigger manager for '{uri}': {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    /// The trigger manager answered with a status of 400 or above.
    #[error("{status_line}: error triggering event '{uri}'")]
    Status {
        status: u16,
        status_line: String,
        uri: String,
        upstream: Option<ErrorResponse>,
    },
    #[error("unexpected trigger manager response for '{uri}': {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DispatchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
