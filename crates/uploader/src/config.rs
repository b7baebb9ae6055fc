//! Uploader configuration.

use std::time::Duration;

use partwise_protocol::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PART_SIZE, PART_URL_TTL};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Tuning for one coordinator. Durations are whole seconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Bytes per part. Every part except the last has exactly this size.
    pub part_size: u64,
    /// Parts in flight at once.
    pub max_concurrency: usize,
    /// Validity of one signed part URL; also bounds one part attempt.
    #[serde(with = "duration_secs")]
    pub part_url_ttl: Duration,
    /// How long to wait for in-flight parts after cancellation.
    #[serde(with = "duration_secs")]
    pub shutdown_grace: Duration,
    /// Bound on the best-effort abort call.
    #[serde(with = "duration_secs")]
    pub abort_timeout: Duration,
    /// Attempts per part, each with a fresh URL. 1 fails fast.
    pub max_part_attempts: u32,
    /// Streaming slice size; sets progress granularity.
    pub stream_chunk_size: usize,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            part_url_ttl: PART_URL_TTL,
            shutdown_grace: Duration::from_secs(5),
            abort_timeout: Duration::from_secs(10),
            max_part_attempts: 1,
            stream_chunk_size: 256 * 1024,
        }
    }
}

impl UploaderConfig {
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.part_size == 0 {
            return Err(UploadError::Validation("part size must be positive".into()));
        }
        if self.max_concurrency == 0 {
            return Err(UploadError::Validation("concurrency must be at least 1".into()));
        }
        if self.max_part_attempts == 0 {
            return Err(UploadError::Validation("part attempts must be at least 1".into()));
        }
        if self.stream_chunk_size == 0 {
            return Err(UploadError::Validation("stream chunk size must be positive".into()));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
