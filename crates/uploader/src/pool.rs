//! Bounded worker pool over a shared FIFO queue of parts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use partwise_transfer::{PartResult, PartSpec, TransferError};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{PartFailure, UploadError};
use crate::part::PartUpload;
use crate::progress::ProgressSink;

/// Runs up to `concurrency` part uploads at once.
pub struct WorkerPool {
    uploader: Arc<dyn PartUpload>,
    concurrency: usize,
    shutdown_grace: Duration,
}

type FailureSlot = Arc<Mutex<Option<(u32, PartFailure)>>>;

impl WorkerPool {
    pub fn new(uploader: Arc<dyn PartUpload>, concurrency: usize, shutdown_grace: Duration) -> Self {
        Self {
            uploader,
            concurrency: concurrency.max(1),
            shutdown_grace,
        }
    }

    /// Uploads every part in `parts` and returns one result per part, in
    /// completion order.
    ///
    /// The first part failure stops all claims and cancels in-flight
    /// transfers. Cancelling `cancel` does the same. Either way the pool
    /// waits at most `shutdown_grace` for workers to unwind, drops whatever
    /// results were collected, and reports the failure.
    pub async fn run(
        &self,
        parts: Vec<PartSpec>,
        progress: ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<PartResult>, UploadError> {
        let planned = parts.len();
        if planned == 0 {
            return Ok(Vec::new());
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(parts)));
        let failure: FailureSlot = Arc::new(Mutex::new(None));
        let stop = cancel.child_token();

        let workers = self.concurrency.min(planned);
        let mut set = JoinSet::new();
        for worker in 0..workers {
            set.spawn(worker_loop(
                worker,
                Arc::clone(&self.uploader),
                Arc::clone(&queue),
                progress.clone(),
                stop.clone(),
                Arc::clone(&failure),
            ));
        }
        drop(progress);

        let mut results = Vec::with_capacity(planned);
        let mut deadline: Option<Instant> = None;
        loop {
            let joined = match deadline {
                None => tokio::select! {
                    joined = set.join_next() => joined,
                    _ = stop.cancelled() => {
                        deadline = Some(Instant::now() + self.shutdown_grace);
                        continue;
                    }
                },
                Some(at) => match tokio::time::timeout_at(at, set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(remaining = set.len(), "workers did not stop in time, aborting them");
                        set.abort_all();
                        break;
                    }
                },
            };

            let Some(joined) = joined else { break };
            match joined {
                Ok(done) => results.extend(done),
                Err(e) => {
                    let mut slot = failure.lock().await;
                    if slot.is_none() {
                        *slot = Some((0, PartFailure::Worker(e.to_string())));
                    }
                    stop.cancel();
                }
            }
        }

        if let Some((part_number, cause)) = failure.lock().await.take() {
            if !results.is_empty() {
                debug!(discarded = results.len(), "dropping results of failed upload");
            }
            return Err(UploadError::PartTransfer { part_number, cause });
        }
        if cancel.is_cancelled() {
            if !results.is_empty() {
                warn!(discarded = results.len(), "dropping results of cancelled upload");
            }
            return Err(UploadError::Cancelled);
        }
        if results.len() != planned {
            return Err(UploadError::Transfer(TransferError::Manifest(format!(
                "{} of {planned} parts produced results",
                results.len()
            ))));
        }
        Ok(results)
    }
}

async fn worker_loop(
    worker: usize,
    uploader: Arc<dyn PartUpload>,
    queue: Arc<Mutex<VecDeque<PartSpec>>>,
    progress: ProgressSink,
    stop: CancellationToken,
    failure: FailureSlot,
) -> Vec<PartResult> {
    let mut results = Vec::new();

    loop {
        if stop.is_cancelled() {
            break;
        }
        let Some(part) = queue.lock().await.pop_front() else {
            break;
        };
        debug!(worker, part_number = part.part_number, "claimed part");

        match uploader
            .upload(part, progress.for_part(part.part_number), stop.clone())
            .await
        {
            Ok(result) => {
                progress.complete(result.part_number, result.bytes);
                results.push(result);
            }
            Err(cause) => {
                progress.discard(part.part_number);
                if !matches!(cause, PartFailure::Cancelled) {
                    warn!(worker, part_number = part.part_number, error = %cause, "part failed");
                    let mut slot = failure.lock().await;
                    if slot.is_none() {
                        *slot = Some((part.part_number, cause));
                    }
                }
                stop.cancel();
                break;
            }
        }
    }

    results
}
