//! Free list of reusable log records.
//!
//! Records are checked out by producers, moved through the queue, and handed
//! back by the writer after their batch is flushed. Every slot is either
//! sitting in the free list or owned by exactly one holder, so the counters
//! below always balance: `created == available + checked_out`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::LogRecord;

/// Default number of idle records kept for reuse.
pub const DEFAULT_RETAIN: usize = 4096;

/// A bounded free list of [`LogRecord`]s.
#[derive(Debug)]
pub struct EntryPool {
    free: Mutex<Vec<LogRecord>>,
    retain: usize,
    created: AtomicUsize,
    checked_out: AtomicUsize,
}

impl EntryPool {
    /// Create a pool keeping at most `retain` idle records.
    pub fn new(retain: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(retain.min(DEFAULT_RETAIN))),
            retain,
            created: AtomicUsize::new(0),
            checked_out: AtomicUsize::new(0),
        }
    }

    /// Take a reset record, allocating a fresh one if the free list is empty.
    pub fn acquire(&self) -> LogRecord {
        self.checked_out.fetch_add(1, Ordering::Relaxed);
        let reused = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            LogRecord::new()
        })
    }

    /// Return a record; its content is cleared and its allocation kept if there is room.
    pub fn release(&self, mut record: LogRecord) {
        self.checked_out.fetch_sub(1, Ordering::Relaxed);
        record.reset();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.retain {
            free.push(record);
        } else {
            self.created.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Return every record of a drained batch.
    pub fn release_all(&self, records: impl IntoIterator<Item = LogRecord>) {
        for record in records {
            self.release(record);
        }
    }

    /// Number of idle records ready for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of records currently held outside the pool.
    pub fn checked_out(&self) -> usize {
        self.checked_out.load(Ordering::Relaxed)
    }

    /// Number of live records the pool accounts for.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl Default for EntryPool {
    fn default() -> Self {
        Self::new(DEFAULT_RETAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn test_acquire_allocates_when_empty() {
        let pool = EntryPool::new(4);
        let rec = pool.acquire();
        assert!(rec.message.capacity() >= crate::record::MESSAGE_CAPACITY);
        assert_eq!(pool.checked_out(), 1);
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.available(), 0);
        pool.release(rec);
    }

    #[test]
    fn test_release_resets_and_reuses() {
        let pool = EntryPool::new(4);
        let mut rec = pool.acquire();
        rec.level = Level::Error;
        rec.message.push_str("payload");
        pool.release(rec);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.checked_out(), 0);

        let again = pool.acquire();
        assert!(again.message.is_empty());
        assert_eq!(again.level, Level::Debug);
        assert_eq!(pool.created(), 1, "record should have been reused");
        pool.release(again);
    }

    #[test]
    fn test_retain_bound() {
        let pool = EntryPool::new(2);
        let records: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        assert_eq!(pool.created(), 5);
        pool.release_all(records);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.checked_out(), 0);
    }

    #[test]
    fn test_concurrent_checkout_balances() {
        let pool = std::sync::Arc::new(EntryPool::new(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let rec = pool.acquire();
                        pool.release(rec);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.checked_out(), 0);
        assert_eq!(pool.created(), pool.available());
    }
}
