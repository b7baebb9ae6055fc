use serde::{Deserialize, Serialize};

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadState {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "creating")]
    Creating,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "completing")]
    Completing,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl UploadState {
    /// Returns `true` for `Done`, `Failed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::Done | UploadState::Failed | UploadState::Cancelled
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        match (self, next) {
            (Idle, Creating) => true,
            (Creating, Uploading | Failed | Cancelled) => true,
            // Zero-byte sources have no parts to upload.
            (Creating, Completing) => true,
            (Uploading, Completing | Failed | Cancelled) => true,
            (Completing, Done | Failed | Cancelled) => true,
            // A terminal session may be replaced by a fresh submission.
            (from, Creating) => from.is_terminal(),
            _ => false,
        }
    }
}
