use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default part size: 10 MiB.
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Smallest part the object store accepts for any part but the last (5 MiB).
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of parts uploaded concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Validity window of a signed part-upload URL.
pub const PART_URL_TTL: Duration = Duration::from_secs(10 * 60);

/// Response header carrying the storage-assigned part identifier.
pub const ETAG_HEADER: &str = "etag";

/// Fallback file name when the client sends none.
pub const DEFAULT_FILE_NAME: &str = "upload.bin";

/// Fallback content type when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Control-plane action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Presign,
    Complete,
    Abort,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Presign => "presign",
            Action::Complete => "complete",
            Action::Abort => "abort",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
