//! The single consumer of the ingestion queue.
//!
//! Records are accumulated into a batch that is flushed when it reaches the
//! high-water mark or when the periodic tick finds it non-empty. The queue is
//! closed by dropping its sender; everything still queued at that point is
//! drained and flushed before the file is closed.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, select, tick};

use crate::writer::LogWriter;
use crate::{EntryPool, LogRecord};

/// Name of the consumer thread.
pub const THREAD_NAME: &str = "rotalog-writer";

/// Pending records plus the writer they are flushed to.
struct Batcher {
    writer: LogWriter,
    pool: Arc<EntryPool>,
    batch: Vec<LogRecord>,
    batch_size: usize,
}

impl Batcher {
    fn push(&mut self, record: LogRecord) {
        self.batch.push(record);
        if self.batch.len() >= self.batch_size {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        self.writer.write_batch(&self.batch);
        self.pool.release_all(self.batch.drain(..));
    }
}

/// Consumer loop owning the writer and all rotation state.
pub(crate) struct Processor {
    receiver: Receiver<LogRecord>,
    interval: Duration,
    batcher: Batcher,
}

impl Processor {
    pub fn new(
        receiver: Receiver<LogRecord>,
        writer: LogWriter,
        pool: Arc<EntryPool>,
        batch_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            receiver,
            interval,
            batcher: Batcher {
                writer,
                pool,
                batch: Vec::with_capacity(batch_size.min(crate::config::DEFAULT_BATCH_SIZE)),
                batch_size,
            },
        }
    }

    /// Run the loop on a dedicated thread; the handle yields the file close result.
    pub fn spawn(self) -> io::Result<JoinHandle<io::Result<()>>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    fn run(self) -> io::Result<()> {
        let Processor {
            receiver,
            interval,
            mut batcher,
        } = self;
        let ticker = tick(interval);

        loop {
            select! {
                recv(receiver) -> msg => match msg {
                    Ok(record) => batcher.push(record),
                    // Every sender is gone and the queue is empty.
                    Err(_) => break,
                },
                recv(ticker) -> _ => batcher.flush(),
            }
        }

        batcher.flush();
        tracing::debug!(target: "rotalog", "log writer drained");
        batcher.writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Counters;
    use crate::writer::ConsoleSink;
    use crate::{Level, LogConfig};
    use std::io::Write;
    use std::sync::Mutex;

    fn start(
        config: &LogConfig,
    ) -> (
        crossbeam_channel::Sender<LogRecord>,
        JoinHandle<io::Result<()>>,
        Arc<EntryPool>,
        Arc<Counters>,
    ) {
        let boxed: Box<dyn Write + Send> = Box::new(io::sink());
        let console: ConsoleSink = Arc::new(Mutex::new(boxed));
        let counters = Arc::new(Counters::default());
        let pool = Arc::new(EntryPool::default());
        let writer = LogWriter::open(config, console, counters.clone()).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(config.buffer_size);
        let handle = Processor::new(
            rx,
            writer,
            pool.clone(),
            config.batch_size,
            config.flush_interval(),
        )
        .spawn()
        .unwrap();
        (tx, handle, pool, counters)
    }

    fn record(pool: &EntryPool, i: usize) -> LogRecord {
        let mut rec = pool.acquire();
        rec.level = Level::Info;
        rec.message.push_str(&format!("r{}", i));
        rec.file = "src/lib.rs";
        rec.line = 1;
        rec.timestamp_nanos = crate::record::now_nanos();
        rec
    }

    #[test]
    fn test_drains_queue_on_disconnect() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new()
            .with_path(dir.path().join("app"))
            .with_buffer_size(1000)
            // Large interval so only the drain can flush.
            .with_flush_interval(Duration::from_secs(60));
        let (tx, handle, pool, counters) = start(&config);

        for i in 0..500 {
            tx.send(record(&pool, i)).unwrap();
        }
        drop(tx);
        handle.join().unwrap().unwrap();

        let content = std::fs::read_to_string(dir.path().join("app.1.log")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 500);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.ends_with(&format!(" r{}", i)), "out of order: {}", line);
        }
        assert_eq!(counters.snapshot().written, 500);
        assert_eq!(pool.checked_out(), 0);
    }

    #[test]
    fn test_tick_flushes_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new()
            .with_path(dir.path().join("app"))
            .with_buffer_size(16)
            .with_flush_interval(Duration::from_millis(1));
        let (tx, handle, pool, counters) = start(&config);

        tx.send(record(&pool, 0)).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while counters.snapshot().written == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(counters.snapshot().written, 1, "tick should flush a lone record");

        drop(tx);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_high_water_mark_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new()
            .with_path(dir.path().join("app"))
            .with_buffer_size(64)
            .with_batch_size(4)
            .with_flush_interval(Duration::from_secs(60));
        let (tx, handle, pool, counters) = start(&config);

        for i in 0..4 {
            tx.send(record(&pool, i)).unwrap();
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while counters.snapshot().written < 4 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(counters.snapshot().written, 4);

        drop(tx);
        handle.join().unwrap().unwrap();
    }
}
