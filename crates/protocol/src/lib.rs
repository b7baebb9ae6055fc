//! Wire protocol types for the partwise control plane.
//!
//! Every control-plane call is a JSON `POST` whose body carries an
//! `action` tag (`create`, `presign`, `complete`, `abort`). Part bytes
//! never travel through the control plane: they are `PUT` directly to
//! the signed URL returned by `presign`.

pub mod constants;
pub mod keys;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::Action;
pub use keys::{derive_object_key, sanitize};
pub use messages::{
    AbortUploadRequest, AbortUploadResponse, CompleteUploadRequest, CompleteUploadResponse,
    ControlRequest, CreateSessionRequest, CreateSessionResponse, ErrorResponse, ManifestPart,
    PresignPartRequest, PresignPartResponse,
};
pub use types::UploadState;
