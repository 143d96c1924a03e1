use std::sync::atomic::{AtomicU64, Ordering};

/// Pipeline counters shared by the front-end and the writer.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub accepted: AtomicU64,
    pub dropped: AtomicU64,
    pub filtered: AtomicU64,
    pub written: AtomicU64,
    pub rotations: AtomicU64,
    pub write_errors: AtomicU64,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a logger's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Records enqueued.
    pub accepted: u64,
    /// Records discarded because the queue was full.
    pub dropped: u64,
    /// Records below the minimum level.
    pub filtered: u64,
    /// Records written to a log file.
    pub written: u64,
    /// Successful rotations.
    pub rotations: u64,
    /// Failed file writes.
    pub write_errors: u64,
}
