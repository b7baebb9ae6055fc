//! Progress funnel.
//!
//! Workers never touch the aggregator. They send updates over a channel to
//! a single task that owns it and publishes snapshots.

use partwise_transfer::ProgressAggregator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::events::Reporter;
use crate::types::UploadEvent;

#[derive(Debug)]
enum Update {
    Transferred { part_number: u32, bytes: u64 },
    Completed { part_number: u32, bytes: u64 },
    Discarded { part_number: u32 },
}

/// Sending side of the funnel, cloned into each worker.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<Update>,
}

impl ProgressSink {
    /// Handle for reporting one part's bytes.
    pub fn for_part(&self, part_number: u32) -> PartProgress {
        PartProgress {
            part_number,
            tx: self.tx.clone(),
        }
    }

    pub fn complete(&self, part_number: u32, bytes: u64) {
        let _ = self.tx.send(Update::Completed { part_number, bytes });
    }

    pub fn discard(&self, part_number: u32) {
        let _ = self.tx.send(Update::Discarded { part_number });
    }
}

/// Reports the absolute bytes sent for one part in the current attempt.
#[derive(Debug, Clone)]
pub struct PartProgress {
    part_number: u32,
    tx: mpsc::UnboundedSender<Update>,
}

impl PartProgress {
    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    pub fn report(&self, bytes: u64) {
        let _ = self.tx.send(Update::Transferred {
            part_number: self.part_number,
            bytes,
        });
    }

    /// Forgets the in-flight bytes of a failed attempt.
    pub fn reset(&self) {
        let _ = self.tx.send(Update::Discarded {
            part_number: self.part_number,
        });
    }
}

/// Spawns the task that owns the aggregator for `total_bytes`.
///
/// The task ends once every sink and part handle is dropped and hands the
/// aggregator back.
pub(crate) fn spawn_funnel(
    total_bytes: u64,
    reporter: Reporter,
) -> (ProgressSink, JoinHandle<ProgressAggregator>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut aggregator = ProgressAggregator::new(total_bytes);
        let mut last_percent = aggregator.snapshot().percent;

        while let Some(update) = rx.recv().await {
            let snapshot = match update {
                Update::Transferred { part_number, bytes } => aggregator.update(part_number, bytes),
                Update::Completed { part_number, bytes } => {
                    reporter.emit(UploadEvent::PartUploaded { part_number, bytes });
                    aggregator.complete_part(part_number, bytes)
                }
                Update::Discarded { part_number } => {
                    trace!(part_number, "discarding in-flight progress");
                    aggregator.discard_part(part_number)
                }
            };

            reporter.progress(snapshot);
            if snapshot.percent != last_percent {
                last_percent = snapshot.percent;
                reporter.emit(UploadEvent::Progress(snapshot));
            }
        }

        aggregator
    });

    (ProgressSink { tx }, handle)
}
