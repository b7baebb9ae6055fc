//! Data types for the upload flow.

use partwise_protocol::UploadState;
use partwise_transfer::{ProgressSnapshot, UploadSource};

/// One upload request from the user.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Uploader's identifying name. Must not be blank.
    pub name: String,
    /// The file to send. `None` means nothing was selected.
    pub source: Option<UploadSource>,
}

impl Submission {
    pub fn new(name: impl Into<String>, source: UploadSource) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
        }
    }

    /// Checks the inputs before any network call.
    pub(crate) fn validate(&self) -> Result<&UploadSource, String> {
        let Some(source) = &self.source else {
            return Err("Select a file first.".into());
        };
        if self.name.trim().is_empty() {
            return Err("Enter your name.".into());
        }
        Ok(source)
    }
}

/// Result of a finalized upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub object_key: String,
    pub upload_id: String,
    pub parts: usize,
    pub bytes: u64,
    /// Confirmation message from the control plane.
    pub message: String,
    /// Identifier of the persisted upload record.
    pub record_id: String,
}

/// The single user-facing message of the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Notice {
    #[default]
    None,
    Validation(String),
    Error(String),
    Cancelled,
    Success { message: String, record_id: String },
}

/// Snapshot of the coordinator for UIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStatus {
    pub state: UploadState,
    pub progress: ProgressSnapshot,
    pub notice: Notice,
}

/// Event emitted while an upload runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    StateChanged { from: UploadState, to: UploadState },
    /// Overall percentage moved.
    Progress(ProgressSnapshot),
    PartUploaded { part_number: u32, bytes: u64 },
    Completed(UploadOutcome),
    Failed { error: String },
    Cancelled,
}
