//! Single-part upload: fresh signed URL, streamed `PUT`, identifier capture.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use partwise_client::{PartTransport, ProgressFn, SessionClient};
use partwise_protocol::PresignPartRequest;
use partwise_transfer::{PartResult, PartSpec, UploadSource};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PartFailure;
use crate::progress::PartProgress;

/// Uploads one planned part.
///
/// The pool is generic over this trait so scheduling can be tested without
/// a network.
pub trait PartUpload: Send + Sync {
    /// Transfers `part` and returns its result. Must return
    /// [`PartFailure::Cancelled`] promptly once `cancel` fires.
    fn upload(
        &self,
        part: PartSpec,
        progress: PartProgress,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<PartResult, PartFailure>> + Send + '_>>;
}

/// [`PartUpload`] backed by the control plane and the object store.
pub struct PartUploader {
    session: Arc<dyn SessionClient>,
    transport: Arc<dyn PartTransport>,
    source: Arc<UploadSource>,
    object_key: String,
    upload_id: String,
    attempt_timeout: Duration,
    max_attempts: u32,
}

impl PartUploader {
    pub fn new(
        session: Arc<dyn SessionClient>,
        transport: Arc<dyn PartTransport>,
        source: Arc<UploadSource>,
        object_key: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            session,
            transport,
            source,
            object_key: object_key.into(),
            upload_id: upload_id.into(),
            attempt_timeout: partwise_protocol::constants::PART_URL_TTL,
            max_attempts: 1,
        }
    }

    /// Bounds one attempt; normally the signed URL validity.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn attempt(&self, part: PartSpec, progress: &PartProgress) -> Result<PartResult, PartFailure> {
        let body = self.source.read_part(&part).await.map_err(PartFailure::Source)?;

        let url = self
            .session
            .request_part_url(PresignPartRequest {
                key: self.object_key.clone(),
                upload_id: self.upload_id.clone(),
                part_number: part.part_number,
            })
            .await
            .map_err(PartFailure::Url)?
            .url;

        let reporter = progress.clone();
        let on_progress: ProgressFn = Arc::new(move |bytes| reporter.report(bytes));

        let etag = self
            .transport
            .put_part(url, self.source.content_type().to_string(), body, on_progress)
            .await
            .map_err(PartFailure::Transport)?
            .ok_or(PartFailure::MissingIdentifier)?;

        Ok(PartResult {
            part_number: part.part_number,
            etag,
            bytes: part.length,
        })
    }
}

impl PartUpload for PartUploader {
    fn upload(
        &self,
        part: PartSpec,
        progress: PartProgress,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<PartResult, PartFailure>> + Send + '_>> {
        Box::pin(async move {
            let mut attempt = 1;
            loop {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(PartFailure::Cancelled),
                    timed = tokio::time::timeout(self.attempt_timeout, self.attempt(part, &progress)) => {
                        timed.unwrap_or(Err(PartFailure::Timeout(self.attempt_timeout)))
                    }
                };

                match outcome {
                    Ok(result) => {
                        debug!(part_number = part.part_number, bytes = result.bytes, attempt, "part uploaded");
                        return Ok(result);
                    }
                    Err(PartFailure::Cancelled) => return Err(PartFailure::Cancelled),
                    Err(e) if attempt < self.max_attempts => {
                        warn!(part_number = part.part_number, attempt, error = %e, "part attempt failed, retrying");
                        progress.reset();
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
    }
}
