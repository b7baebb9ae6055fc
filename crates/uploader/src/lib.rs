//! Multipart upload coordinator.
//!
//! This crate holds the **business logic** of sending one file to an
//! object store in parts. It has no UI: callers supply a
//! [`SessionClient`](partwise_client::SessionClient) and a
//! [`PartTransport`](partwise_client::PartTransport) and observe the
//! upload through events and status snapshots.
//!
//! # Pipeline
//!
//! 1. **Validate**: a file and a non-blank name, before any network call
//! 2. **Create**: open a multipart session on the control plane
//! 3. **Upload**: a bounded worker pool streams parts to signed URLs
//! 4. **Complete**: submit the manifest sorted by part number
//!
//! Failures and cancellations after step 2 abort the session.

pub mod config;
pub mod coordinator;
pub mod error;
mod events;
pub mod part;
pub mod pool;
pub mod progress;
mod session;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export primary types for convenience.
pub use config::UploaderConfig;
pub use coordinator::Coordinator;
pub use error::{PartFailure, UploadError};
pub use part::{PartUpload, PartUploader};
pub use pool::WorkerPool;
pub use progress::{PartProgress, ProgressSink};
pub use types::{Notice, Submission, UploadEvent, UploadOutcome, UploadStatus};
