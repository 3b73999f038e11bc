use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Snapshot of what a pool has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCounts {
    pub submitted: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subset of `failed`.
    pub timed_out: usize,
}

impl PoolCounts {
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Counters bumped by the workers; read through `PoolCounts`.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,
}

impl Counters {
    pub fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self, record: &Record) {
        if record.is_success() {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.failed.fetch_add(1, Ordering::Relaxed);
        if record.failure().is_some_and(|f| f.is_timeout()) {
            self.timed_out.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, queued: usize, unfinished: usize) -> PoolCounts {
        PoolCounts {
            submitted: self.submitted.load(Ordering::Relaxed),
            queued,
            in_flight: unfinished.saturating_sub(queued),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}
