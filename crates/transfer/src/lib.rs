//! Part planning, source reads, manifests and progress aggregation.
//!
//! Everything here is transport-agnostic: the uploader crate drives
//! these types over the network.

mod plan;
mod progress;
mod source;
mod types;

pub use plan::{PartSpec, plan_parts};
pub use progress::{ProgressAggregator, ProgressSnapshot};
pub use source::{UploadSource, detect_content_type};
pub use types::{PartResult, UploadManifest};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("part {part_number} is outside the source ({size} bytes)")]
    OutOfRange { part_number: u32, size: u64 },
}
