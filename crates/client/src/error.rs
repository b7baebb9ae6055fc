//! Client error types.

use partwise_protocol::Action;

/// Errors from the control-plane and storage clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{action} failed ({status}): {message}")]
    Status {
        action: Action,
        status: u16,
        message: String,
    },

    #[error("storage rejected part ({status}): {body}")]
    Storage { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{action} response is missing {field}")]
    MissingField { action: Action, field: &'static str },

    #[error("invalid {action} request: {message}")]
    InvalidRequest { action: Action, message: String },
}

impl ClientError {
    /// HTTP status of the failed call, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::Storage { status, .. } => {
                Some(*status)
            }
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
