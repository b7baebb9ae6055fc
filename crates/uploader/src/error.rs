//! Upload error types.

use std::time::Duration;

use partwise_client::ClientError;
use partwise_protocol::Action;
use partwise_transfer::TransferError;

/// Why a single part could not be uploaded.
#[derive(Debug, thiserror::Error)]
pub enum PartFailure {
    #[error("could not obtain upload URL: {0}")]
    Url(#[source] ClientError),

    #[error("transfer failed: {0}")]
    Transport(#[source] ClientError),

    #[error("storage accepted the part but returned no identifier")]
    MissingIdentifier,

    #[error("transfer did not finish within {0:?}")]
    Timeout(Duration),

    #[error("transfer cancelled")]
    Cancelled,

    #[error("reading source failed: {0}")]
    Source(#[source] TransferError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl PartFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            PartFailure::Url(e) | PartFailure::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Errors produced by an upload session.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Bad input caught before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("{action} failed: {source}")]
    Session {
        action: Action,
        #[source]
        source: ClientError,
    },

    #[error("part {part_number} failed: {cause}")]
    PartTransfer {
        part_number: u32,
        #[source]
        cause: PartFailure,
    },

    #[error("upload cancelled")]
    Cancelled,

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl UploadError {
    /// HTTP status behind the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Session { source, .. } => source.status(),
            UploadError::PartTransfer { cause, .. } => cause.status(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }

    pub(crate) fn session(action: Action) -> impl FnOnce(ClientError) -> Self {
        move |source| UploadError::Session { action, source }
    }
}
