//! Event and status publication shared by the session and its workers.

use std::sync::Arc;

use partwise_protocol::UploadState;
use partwise_transfer::ProgressSnapshot;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::types::{Notice, UploadEvent, UploadStatus};

/// Publishes lifecycle changes to the event channel and the status cell.
#[derive(Debug, Clone)]
pub(crate) struct Reporter {
    events: mpsc::UnboundedSender<UploadEvent>,
    status: Arc<watch::Sender<UploadStatus>>,
}

impl Reporter {
    pub fn new(
        events: mpsc::UnboundedSender<UploadEvent>,
        status: Arc<watch::Sender<UploadStatus>>,
    ) -> Self {
        Self { events, status }
    }

    pub fn state(&self) -> UploadState {
        self.status.borrow().state
    }

    /// Moves the lifecycle to `to`. Disallowed moves are logged and ignored.
    pub fn transition(&self, to: UploadState) -> bool {
        let from = self.state();
        if !from.can_transition_to(to) {
            warn!(from = ?from, to = ?to, "ignoring invalid state transition");
            return false;
        }
        self.status.send_modify(|s| {
            s.state = to;
            if to == UploadState::Creating {
                s.progress = ProgressSnapshot::default();
                s.notice = Notice::None;
            }
        });
        info!(from = ?from, to = ?to, "upload state changed");
        self.emit(UploadEvent::StateChanged { from, to });
        true
    }

    pub fn progress(&self, snapshot: ProgressSnapshot) {
        self.status.send_modify(|s| s.progress = snapshot);
    }

    pub fn notice(&self, notice: Notice) {
        self.status.send_modify(|s| s.notice = notice);
    }

    pub fn emit(&self, event: UploadEvent) {
        // Nobody listening is fine; status still carries the latest state.
        let _ = self.events.send(event);
    }
}
