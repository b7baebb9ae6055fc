use std::collections::{HashMap, HashSet};

/// Aggregate transfer state at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Bytes of parts that finished uploading.
    pub confirmed_bytes: u64,
    /// Bytes reported so far by parts still in flight.
    pub in_flight_bytes: u64,
    pub total_bytes: u64,
    /// Overall percentage, 0-100, never decreasing within a session.
    pub percent: u8,
}

impl ProgressSnapshot {
    /// Bytes counted toward the percentage.
    pub fn transferred_bytes(&self) -> u64 {
        self.confirmed_bytes + self.in_flight_bytes
    }
}

/// Merges per-part byte counters into one overall percentage.
///
/// Each in-flight part keeps its latest absolute byte count. Reports for
/// the same part replace the previous value, so repeated or out-of-order
/// callbacks never double count. Completing a part moves its length into
/// the confirmed total; late reports for a completed part are ignored.
#[derive(Debug)]
pub struct ProgressAggregator {
    total_bytes: u64,
    confirmed_bytes: u64,
    in_flight: HashMap<u32, u64>,
    completed: HashSet<u32>,
    percent: u8,
}

impl ProgressAggregator {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            confirmed_bytes: 0,
            in_flight: HashMap::new(),
            completed: HashSet::new(),
            percent: 0,
        }
    }

    /// Records that `part_number` has transferred `bytes` so far.
    pub fn update(&mut self, part_number: u32, bytes: u64) -> ProgressSnapshot {
        if !self.completed.contains(&part_number) {
            self.in_flight.insert(part_number, bytes);
        }
        self.refresh()
    }

    /// Marks `part_number` as fully uploaded with `length` bytes.
    pub fn complete_part(&mut self, part_number: u32, length: u64) -> ProgressSnapshot {
        self.in_flight.remove(&part_number);
        if self.completed.insert(part_number) {
            self.confirmed_bytes += length;
        }
        self.refresh()
    }

    /// Drops the in-flight counter of a part that will be retried or abandoned.
    ///
    /// The percentage does not move backwards.
    pub fn discard_part(&mut self, part_number: u32) -> ProgressSnapshot {
        self.in_flight.remove(&part_number);
        self.refresh()
    }

    /// Forces the snapshot to 100% once the object is finalized.
    pub fn finish(&mut self) -> ProgressSnapshot {
        self.in_flight.clear();
        self.confirmed_bytes = self.total_bytes;
        self.percent = 100;
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            confirmed_bytes: self.confirmed_bytes,
            in_flight_bytes: self.in_flight.values().sum(),
            total_bytes: self.total_bytes,
            percent: self.percent,
        }
    }

    fn refresh(&mut self) -> ProgressSnapshot {
        let mut snapshot = self.snapshot();
        let current = percent_of(snapshot.transferred_bytes(), self.total_bytes);
        self.percent = self.percent.max(current);
        snapshot.percent = self.percent;
        snapshot
    }
}

/// `round(100 * done / total)` clamped to `[0, 100]`; zero when `total` is zero.
fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = u128::from(done.min(total));
    let total = u128::from(total);
    ((200 * done + total) / (2 * total)) as u8
}
