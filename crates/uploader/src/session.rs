//! One upload session from `Creating` to a terminal state.
//!
//! # Lifecycle
//!
//! 1. **Create**: open a multipart session on the control plane
//! 2. **Upload**: run the worker pool over the planned parts
//! 3. **Complete**: submit the sorted manifest
//!
//! A failure after the session exists moves to `Failed`, a cancellation to
//! `Cancelled`; both then attempt a bounded, best-effort abort.

use std::sync::Arc;

use partwise_client::{PartTransport, SessionClient};
use partwise_protocol::constants::{DEFAULT_CONTENT_TYPE, DEFAULT_FILE_NAME};
use partwise_protocol::{
    AbortUploadRequest, Action, CompleteUploadRequest, CreateSessionRequest, CreateSessionResponse,
    UploadState,
};
use partwise_transfer::{PartSpec, ProgressAggregator, UploadManifest, UploadSource, plan_parts};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::events::Reporter;
use crate::part::PartUploader;
use crate::pool::WorkerPool;
use crate::progress::spawn_funnel;
use crate::types::{Notice, UploadEvent, UploadOutcome};

/// Drives one submission through the lifecycle.
pub(crate) struct UploadSession {
    client: Arc<dyn SessionClient>,
    transport: Arc<dyn PartTransport>,
    config: UploaderConfig,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl UploadSession {
    pub fn new(
        client: Arc<dyn SessionClient>,
        transport: Arc<dyn PartTransport>,
        config: UploaderConfig,
        reporter: Reporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            transport,
            config,
            reporter,
            cancel,
        }
    }

    /// Runs the session to completion. The returned error has already been
    /// published as the status notice.
    pub async fn run(self, name: &str, source: UploadSource) -> Result<UploadOutcome, UploadError> {
        let plan = match plan_parts(source.size(), self.config.part_size) {
            Ok(plan) => plan,
            Err(e) => {
                let err = UploadError::from(e);
                self.reporter.notice(Notice::Error(err.to_string()));
                return Err(err);
            }
        };

        self.reporter.transition(UploadState::Creating);
        let session = match self.create(name, &source).await {
            Ok(session) => session,
            Err(e) => return Err(self.finish_with_error(e, None).await),
        };
        info!(
            upload_id = %session.upload_id,
            object_key = %session.key,
            parts = plan.len(),
            bytes = source.size(),
            "upload session created"
        );

        let size = source.size();
        let (manifest, progress) = match self.upload(&session, source, &plan).await {
            Ok(uploaded) => uploaded,
            Err(e) => return Err(self.finish_with_error(e, Some(&session)).await),
        };

        match self.complete(&session, manifest, progress, size).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.finish_with_error(e, Some(&session)).await),
        }
    }

    async fn create(
        &self,
        name: &str,
        source: &UploadSource,
    ) -> Result<CreateSessionResponse, UploadError> {
        let filename = match source.file_name() {
            "" => DEFAULT_FILE_NAME,
            n => n,
        };
        let file_type = match source.content_type() {
            "" => DEFAULT_CONTENT_TYPE,
            t => t,
        };
        let req = CreateSessionRequest {
            name: name.trim().to_string(),
            filename: filename.to_string(),
            file_type: file_type.to_string(),
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UploadError::Cancelled),
            resp = self.client.create_session(req) => resp.map_err(UploadError::session(Action::Create)),
        }
    }

    /// Uploads every part and returns the sorted manifest with the final
    /// progress state. A zero-part plan skips the pool.
    async fn upload(
        &self,
        session: &CreateSessionResponse,
        source: UploadSource,
        plan: &[PartSpec],
    ) -> Result<(UploadManifest, ProgressAggregator), UploadError> {
        if plan.is_empty() {
            self.reporter.transition(UploadState::Completing);
            let manifest = UploadManifest::assemble(plan, Vec::new())?;
            return Ok((manifest, ProgressAggregator::new(0)));
        }

        self.reporter.transition(UploadState::Uploading);
        let (sink, funnel) = spawn_funnel(source.size(), self.reporter.clone());

        let uploader = PartUploader::new(
            Arc::clone(&self.client),
            Arc::clone(&self.transport),
            Arc::new(source),
            session.key.clone(),
            session.upload_id.clone(),
        )
        .with_attempt_timeout(self.config.part_url_ttl)
        .with_max_attempts(self.config.max_part_attempts);

        let pool = WorkerPool::new(
            Arc::new(uploader),
            self.config.max_concurrency,
            self.config.shutdown_grace,
        );
        let results = pool.run(plan.to_vec(), sink, &self.cancel).await;

        // Every sender is gone once the pool returns; wait for the last
        // snapshot so no progress lands after the state change.
        let aggregator = match funnel.await {
            Ok(aggregator) => aggregator,
            Err(e) => {
                warn!(error = %e, "progress task ended abnormally");
                ProgressAggregator::new(plan.iter().map(|p| p.length).sum())
            }
        };

        let results = results?;
        if self.cancel.is_cancelled() {
            warn!(discarded = results.len(), "cancelled after all parts finished");
            return Err(UploadError::Cancelled);
        }
        let manifest = UploadManifest::assemble(plan, results)?;
        self.reporter.transition(UploadState::Completing);
        Ok((manifest, aggregator))
    }

    async fn complete(
        &self,
        session: &CreateSessionResponse,
        manifest: UploadManifest,
        mut progress: ProgressAggregator,
        bytes: u64,
    ) -> Result<UploadOutcome, UploadError> {
        let parts = manifest.len();
        let req = CompleteUploadRequest {
            key: session.key.clone(),
            upload_id: session.upload_id.clone(),
            parts: manifest.into_parts(),
        };

        let resp = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UploadError::Cancelled),
            resp = self.client.complete(req) => resp.map_err(UploadError::session(Action::Complete)),
        }?;

        let snapshot = progress.finish();
        self.reporter.progress(snapshot);
        self.reporter.emit(UploadEvent::Progress(snapshot));
        self.reporter.transition(UploadState::Done);

        let outcome = UploadOutcome {
            object_key: session.key.clone(),
            upload_id: session.upload_id.clone(),
            parts,
            bytes,
            message: resp.msg,
            record_id: resp.id,
        };
        info!(
            upload_id = %outcome.upload_id,
            object_key = %outcome.object_key,
            record_id = %outcome.record_id,
            "upload complete"
        );
        self.reporter.notice(Notice::Success {
            message: outcome.message.clone(),
            record_id: outcome.record_id.clone(),
        });
        self.reporter.emit(UploadEvent::Completed(outcome.clone()));
        Ok(outcome)
    }

    /// Publishes the terminal state for `err` and, when a session exists,
    /// attempts to abort it.
    async fn finish_with_error(
        &self,
        err: UploadError,
        session: Option<&CreateSessionResponse>,
    ) -> UploadError {
        if err.is_cancelled() {
            info!("upload cancelled");
            self.reporter.transition(UploadState::Cancelled);
            self.reporter.notice(Notice::Cancelled);
            self.reporter.emit(UploadEvent::Cancelled);
        } else {
            error!(error = %err, "upload failed");
            self.reporter.transition(UploadState::Failed);
            self.reporter.notice(Notice::Error(err.to_string()));
            self.reporter.emit(UploadEvent::Failed {
                error: err.to_string(),
            });
        }

        if let Some(session) = session {
            self.abort(session).await;
        }
        err
    }

    async fn abort(&self, session: &CreateSessionResponse) {
        let req = AbortUploadRequest {
            key: session.key.clone(),
            upload_id: session.upload_id.clone(),
        };
        match tokio::time::timeout(self.config.abort_timeout, self.client.abort(req)).await {
            Ok(Ok(_)) => info!(upload_id = %session.upload_id, "upload session aborted"),
            Ok(Err(e)) => warn!(upload_id = %session.upload_id, error = %e, "abort failed"),
            Err(_) => warn!(upload_id = %session.upload_id, "abort timed out"),
        }
    }
}
