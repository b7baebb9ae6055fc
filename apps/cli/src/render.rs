//! Terminal rendering of upload progress.

use partwise_transfer::ProgressSnapshot;
use partwise_uploader::{Notice, UploadEvent};

const BAR_WIDTH: usize = 30;

/// One progress line, e.g. `[#######-------]  50%  5.0 MiB / 10.0 MiB`.
pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    let filled = BAR_WIDTH * usize::from(snapshot.percent.min(100)) / 100;
    format!(
        "[{}{}] {:>3}%  {} / {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        snapshot.percent,
        human_bytes(snapshot.transferred_bytes().min(snapshot.total_bytes)),
        human_bytes(snapshot.total_bytes),
    )
}

/// Text for events worth a line of their own.
pub fn event_line(event: &UploadEvent) -> Option<String> {
    match event {
        UploadEvent::StateChanged { to, .. } => Some(format!("{to:?}").to_lowercase()),
        UploadEvent::PartUploaded { part_number, bytes } => {
            Some(format!("part {part_number} uploaded ({})", human_bytes(*bytes)))
        }
        _ => None,
    }
}

pub fn notice_line(notice: &Notice) -> Option<String> {
    match notice {
        Notice::None => None,
        Notice::Validation(message) | Notice::Error(message) => Some(message.clone()),
        Notice::Cancelled => Some("Upload canceled.".into()),
        Notice::Success { message, record_id } => Some(format!("{message} (id: {record_id})")),
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
