//! Upload coordinator: at most one active session at a time.

use std::sync::Arc;

use partwise_client::{PartTransport, SessionClient};
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::events::Reporter;
use crate::session::UploadSession;
use crate::types::{Notice, Submission, UploadEvent, UploadOutcome, UploadStatus};

#[derive(Default)]
struct ActiveSlot {
    /// Bumped by every submission; only the newest may start.
    ticket: u64,
    cancel: Option<CancellationToken>,
}

/// Runs uploads one at a time.
///
/// Submitting while a session is still running cancels that session and
/// waits for it to settle before the new one starts.
pub struct Coordinator {
    client: Arc<dyn SessionClient>,
    transport: Arc<dyn PartTransport>,
    config: UploaderConfig,
    reporter: Reporter,
    status_rx: watch::Receiver<UploadStatus>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<UploadEvent>>>,
    slot: Mutex<ActiveSlot>,
    run_lock: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        client: Arc<dyn SessionClient>,
        transport: Arc<dyn PartTransport>,
        config: UploaderConfig,
    ) -> Result<Self, UploadError> {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(UploadStatus::default());
        Ok(Self {
            client,
            transport,
            config,
            reporter: Reporter::new(events_tx, Arc::new(status_tx)),
            status_rx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
            slot: Mutex::new(ActiveSlot::default()),
            run_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Takes the event receiver. Can only be called once, and only before
    /// the first [`submit`](Self::submit), which drops an untaken receiver.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Current state, progress and notice.
    pub fn status(&self) -> UploadStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status_rx.clone()
    }

    /// Cancels the running session, if any. Returns whether one was running.
    pub async fn cancel(&self) -> bool {
        let slot = self.slot.lock().await;
        match &slot.cancel {
            Some(token) if !token.is_cancelled() => {
                info!("cancelling active upload");
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Validates and runs `submission` to a terminal state.
    ///
    /// Invalid input never reaches the network, leaves the state as it was
    /// and does not disturb a running session. A submission overtaken by a
    /// newer one while waiting returns [`UploadError::Cancelled`] without
    /// starting.
    pub async fn submit(&self, submission: Submission) -> Result<UploadOutcome, UploadError> {
        let source = match submission.validate() {
            Ok(source) => source.clone(),
            Err(message) => {
                self.reporter.notice(Notice::Validation(message.clone()));
                return Err(UploadError::Validation(message));
            }
        };

        if let Ok(mut events) = self.events_rx.lock()
            && events.take().is_some()
        {
            debug!("no event subscriber; dropping the event receiver");
        }

        let ticket = {
            let mut slot = self.slot.lock().await;
            slot.ticket += 1;
            if let Some(previous) = &slot.cancel {
                debug!("new submission replaces the active one");
                previous.cancel();
            }
            slot.ticket
        };

        let _running = self.run_lock.lock().await;

        let cancel = {
            let mut slot = self.slot.lock().await;
            if slot.ticket != ticket {
                debug!("submission superseded before it started");
                return Err(UploadError::Cancelled);
            }
            let token = CancellationToken::new();
            slot.cancel = Some(token.clone());
            token
        };

        let session = UploadSession::new(
            Arc::clone(&self.client),
            Arc::clone(&self.transport),
            self.config.clone(),
            self.reporter.clone(),
            cancel,
        );
        let result = session.run(&submission.name, source).await;
        self.release(ticket).await;
        result
    }

    async fn release(&self, ticket: u64) {
        let mut slot = self.slot.lock().await;
        if slot.ticket == ticket {
            slot.cancel = None;
        }
    }
}
