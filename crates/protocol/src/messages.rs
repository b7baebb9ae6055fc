use serde::{Deserialize, Serialize};

use crate::constants::Action;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of a control-plane call, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlRequest {
    Create(CreateSessionRequest),
    Presign(PresignPartRequest),
    Complete(CompleteUploadRequest),
    Abort(AbortUploadRequest),
}

impl ControlRequest {
    /// Returns the action tag of this request.
    pub fn action(&self) -> Action {
        match self {
            ControlRequest::Create(_) => Action::Create,
            ControlRequest::Presign(_) => Action::Presign,
            ControlRequest::Complete(_) => Action::Complete,
            ControlRequest::Abort(_) => Action::Abort,
        }
    }

    /// Checks required fields the way the control plane does before
    /// touching the store.
    ///
    /// `create` has server-side fallbacks for every field, so it always
    /// passes. The others need the session identifiers echoed back.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ControlRequest::Create(_) => Ok(()),
            ControlRequest::Presign(req) => {
                if req.key.is_empty() || req.upload_id.is_empty() || req.part_number == 0 {
                    return Err("Missing presign params".into());
                }
                Ok(())
            }
            ControlRequest::Complete(req) => {
                if req.key.is_empty() || req.upload_id.is_empty() {
                    return Err("Missing complete params".into());
                }
                validate_manifest(&req.parts)
            }
            ControlRequest::Abort(req) => {
                if req.key.is_empty() || req.upload_id.is_empty() {
                    return Err("Missing abort params".into());
                }
                Ok(())
            }
        }
    }
}

/// Opens a multipart session for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Uploader's identifying name; becomes the key prefix.
    pub name: String,
    pub filename: String,
    pub file_type: String,
}

/// Requests a signed URL for exactly one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignPartRequest {
    pub key: String,
    pub upload_id: String,
    pub part_number: u32,
}

/// Finalizes the object from an ordered manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub key: String,
    pub upload_id: String,
    pub parts: Vec<ManifestPart>,
}

/// Releases a multipart session and its uploaded parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortUploadRequest {
    pub key: String,
    pub upload_id: String,
}

/// One manifest entry. Field names follow the object store's casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPart {
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub upload_id: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresignPartResponse {
    pub url: String,
}

/// Confirmation of a finalized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub msg: String,
    /// Identifier of the persisted upload record.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortUploadResponse {
    pub msg: String,
}

/// Error body returned with any non-2xx control-plane status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Checks that a manifest is sorted strictly ascending by part number,
/// starts at 1, has no gaps and carries no empty identifiers.
pub fn validate_manifest(parts: &[ManifestPart]) -> Result<(), String> {
    for (i, part) in parts.iter().enumerate() {
        let expected = i as u32 + 1;
        if part.part_number != expected {
            return Err(format!(
                "manifest entry {i} has part number {}, expected {expected}",
                part.part_number
            ));
        }
        if part.etag.is_empty() {
            return Err(format!("part {} has an empty ETag", part.part_number));
        }
    }
    Ok(())
}
