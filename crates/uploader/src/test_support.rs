//! In-memory doubles for the control plane and the object store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use partwise_client::{ClientError, ClientFuture, PartTransport, ProgressFn, SessionClient};
use partwise_protocol::{
    AbortUploadRequest, AbortUploadResponse, Action, CompleteUploadRequest,
    CompleteUploadResponse, CreateSessionRequest, CreateSessionResponse, ManifestPart,
    PresignPartRequest, PresignPartResponse, derive_object_key,
};
use tokio::sync::{mpsc, watch};

use crate::events::Reporter;
use crate::types::{UploadEvent, UploadStatus};

pub(crate) fn reporter() -> (
    Reporter,
    mpsc::UnboundedReceiver<UploadEvent>,
    watch::Receiver<UploadStatus>,
) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(UploadStatus::default());
    (Reporter::new(events_tx, Arc::new(status_tx)), events_rx, status_rx)
}

fn server_error(action: Action) -> ClientError {
    ClientError::Status {
        action,
        status: 500,
        message: format!("{action} exploded"),
    }
}

#[derive(Default)]
struct SessionLog {
    created: Vec<CreateSessionRequest>,
    presigned: Vec<u32>,
    completed: Vec<Vec<ManifestPart>>,
    aborted: Vec<String>,
}

/// Control plane double. Session ids are `upload-1`, `upload-2`, ...
#[derive(Default)]
pub(crate) struct MockSession {
    log: Mutex<SessionLog>,
    fail_create: bool,
    fail_complete: bool,
    fail_abort: bool,
    create_delay: Option<Duration>,
    complete_delay: Option<Duration>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    pub fn failing_abort(mut self) -> Self {
        self.fail_abort = true;
        self
    }

    pub fn slow_create(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn slow_complete(mut self, delay: Duration) -> Self {
        self.complete_delay = Some(delay);
        self
    }

    pub fn created(&self) -> Vec<CreateSessionRequest> {
        self.log.lock().unwrap().created.clone()
    }

    pub fn presigned(&self) -> Vec<u32> {
        self.log.lock().unwrap().presigned.clone()
    }

    pub fn completed(&self) -> Vec<Vec<ManifestPart>> {
        self.log.lock().unwrap().completed.clone()
    }

    pub fn aborted(&self) -> Vec<String> {
        self.log.lock().unwrap().aborted.clone()
    }
}

impl SessionClient for MockSession {
    fn create_session(&self, req: CreateSessionRequest) -> ClientFuture<'_, CreateSessionResponse> {
        Box::pin(async move {
            if let Some(delay) = self.create_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_create {
                return Err(server_error(Action::Create));
            }
            let mut log = self.log.lock().unwrap();
            let key = derive_object_key(&req.name, &req.filename, 1_700_000_000_000);
            log.created.push(req);
            Ok(CreateSessionResponse {
                upload_id: format!("upload-{}", log.created.len()),
                key,
            })
        })
    }

    fn request_part_url(&self, req: PresignPartRequest) -> ClientFuture<'_, PresignPartResponse> {
        Box::pin(async move {
            self.log.lock().unwrap().presigned.push(req.part_number);
            Ok(PresignPartResponse {
                url: format!("https://store.test/{}/part/{}", req.upload_id, req.part_number),
            })
        })
    }

    fn complete(&self, req: CompleteUploadRequest) -> ClientFuture<'_, CompleteUploadResponse> {
        Box::pin(async move {
            self.log.lock().unwrap().completed.push(req.parts);
            if let Some(delay) = self.complete_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_complete {
                return Err(server_error(Action::Complete));
            }
            Ok(CompleteUploadResponse {
                msg: "Upload complete".into(),
                id: "rec-1".into(),
            })
        })
    }

    fn abort(&self, req: AbortUploadRequest) -> ClientFuture<'_, AbortUploadResponse> {
        Box::pin(async move {
            self.log.lock().unwrap().aborted.push(req.upload_id);
            if self.fail_abort {
                return Err(server_error(Action::Abort));
            }
            Ok(AbortUploadResponse {
                msg: "Aborted".into(),
            })
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedPut {
    pub part_number: u32,
    pub content_type: String,
    pub len: usize,
}

/// Object store double. The part number is read from the signed URL.
#[derive(Default)]
pub(crate) struct MockTransport {
    puts: Mutex<Vec<RecordedPut>>,
    failures: Mutex<HashMap<u32, usize>>,
    no_etag: HashSet<u32>,
    hang: HashSet<u32>,
    hang_sessions: HashSet<String>,
    fail_after: HashMap<u32, Duration>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transfer takes `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_etag(mut self, part_number: u32) -> Self {
        self.no_etag.insert(part_number);
        self
    }

    /// The first `times` transfers of `part_number` are rejected.
    pub fn fail_times(self, part_number: u32, times: usize) -> Self {
        self.failures.lock().unwrap().insert(part_number, times);
        self
    }

    /// `part_number` is rejected after `delay`.
    pub fn fail_after(mut self, part_number: u32, delay: Duration) -> Self {
        self.fail_after.insert(part_number, delay);
        self
    }

    /// `part_number` never finishes.
    pub fn hang(mut self, part_number: u32) -> Self {
        self.hang.insert(part_number);
        self
    }

    /// Every part of session `upload_id` never finishes.
    pub fn hang_session(mut self, upload_id: &str) -> Self {
        self.hang_sessions.insert(upload_id.to_string());
        self
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl PartTransport for MockTransport {
    fn put_part(
        &self,
        url: String,
        content_type: String,
        body: Bytes,
        progress: ProgressFn,
    ) -> ClientFuture<'_, Option<String>> {
        Box::pin(async move {
            let part_number: u32 = url.rsplit('/').next().unwrap().parse().unwrap();
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            self.puts.lock().unwrap().push(RecordedPut {
                part_number,
                content_type,
                len: body.len(),
            });

            let len = body.len() as u64;
            progress(len / 2);

            let session = url.split('/').rev().nth(2).unwrap_or_default();
            if self.hang.contains(&part_number) || self.hang_sessions.contains(session) {
                std::future::pending::<()>().await;
            }
            if let Some(delay) = self.fail_after.get(&part_number) {
                tokio::time::sleep(*delay).await;
                return Err(ClientError::Storage {
                    status: 500,
                    body: "InternalError".into(),
                });
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let reject = {
                let mut failures = self.failures.lock().unwrap();
                match failures.get_mut(&part_number) {
                    Some(left) if *left > 0 => {
                        *left -= 1;
                        true
                    }
                    _ => false,
                }
            };
            if reject {
                return Err(ClientError::Storage {
                    status: 403,
                    body: "RequestTimeTooSkewed".into(),
                });
            }

            progress(len);
            if self.no_etag.contains(&part_number) {
                return Ok(None);
            }
            Ok(Some(format!("\"etag-{part_number}\"")))
        })
    }
}
