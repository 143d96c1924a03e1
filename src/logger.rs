//! The logger handle: submission front-end and lifecycle.
//!
//! ```rust,no_run
//! use rotalog::{LogConfig, Logger};
//!
//! let logger = Logger::init(&LogConfig::new().with_path("logs/app.log"))?;
//! rotalog::info!(logger, "server started on port {}", 8080);
//! logger.shutdown()?;
//! # Ok::<(), rotalog::Error>(())
//! ```

use std::backtrace::Backtrace;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::processor::Processor;
use crate::record::now_nanos;
use crate::stats::{Counters, Stats};
use crate::writer::{ConsoleSink, LogWriter, console_diagnostic};
use crate::{EntryPool, Error, Level, LogConfig, LogRecord, Result};

/// Console message printed in development mode when the queue is full.
pub const BUFFER_FULL_WARNING: &str = "WARNING: Log buffer full, dropping message";

/// What happened to a submitted record.
///
/// A FATAL submission through [`Logger::log`] or [`Logger::submit_str`] comes
/// back as [`Outcome::Fatal`], so the outcome has to be looked at:
///
/// ```rust,compile_fail
/// #![deny(unused_must_use)]
/// # fn run(logger: &rotalog::Logger) {
/// logger.submit_str(rotalog::Level::Fatal, "unrecoverable");
/// # }
/// ```
#[derive(Debug)]
#[must_use = "a FATAL outcome carries a `Fatal` that should be exited on"]
pub enum Outcome {
    /// Queued for writing.
    Accepted,
    /// Below the minimum level.
    Filtered,
    /// Discarded because the queue was full.
    Dropped,
    /// The logger has been shut down.
    Inactive,
    /// A FATAL record was submitted and the logger has been shut down.
    Fatal(Fatal),
}

impl Outcome {
    /// Whether the record was queued.
    pub fn is_accepted(&self) -> bool {
        match self {
            Self::Accepted => true,
            Self::Fatal(fatal) => fatal.recorded(),
            _ => false,
        }
    }
}

/// Result of a FATAL submission.
///
/// By the time this is returned every queued record has been written and the
/// file closed. Terminating the process is left to the caller.
#[must_use = "the logger has shut down; call `exit` to terminate the process"]
#[derive(Debug)]
pub struct Fatal {
    recorded: bool,
    close: Result<()>,
}

impl Fatal {
    /// Whether the fatal record itself made it into the queue.
    pub fn recorded(&self) -> bool {
        self.recorded
    }

    /// The result of draining and closing the log file.
    pub fn into_result(self) -> Result<()> {
        self.close
    }

    /// Terminate the process with exit status 1.
    pub fn exit(self) -> ! {
        if let Err(e) = &self.close {
            eprintln!("failed to close log file: {}", e);
        }
        std::process::exit(1)
    }
}

struct Inner {
    sender: RwLock<Option<Sender<LogRecord>>>,
    worker: Mutex<Option<JoinHandle<io::Result<()>>>>,
    pool: Arc<EntryPool>,
    counters: Arc<Counters>,
    console: ConsoleSink,
    level: Level,
    dev: bool,
}

impl Inner {
    /// Close the queue and wait for the writer to drain it.
    fn close(&self) -> Result<()> {
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // The lock is held while joining so concurrent callers also wait.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match worker.take() {
            None => Ok(()),
            Some(handle) => match handle.join() {
                Ok(result) => result.map_err(Error::Io),
                Err(_) => Err(Error::Init("log writer thread panicked".to_string())),
            },
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(target: "rotalog", "failed to close logger: {}", e);
        }
    }
}

/// Handle to a running logging pipeline.
///
/// Cloning is cheap and every clone feeds the same pipeline. The pipeline shuts
/// down on [`Logger::shutdown`] or when the last clone is dropped.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.inner.level)
            .field("dev", &self.inner.dev)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Logger {
    /// Open the log file and start the writer, mirroring to stdout in development mode.
    pub fn init(config: &LogConfig) -> Result<Self> {
        Self::with_console(config, Box::new(io::stdout()))
    }

    /// Like [`Logger::init`] but with a custom console destination.
    pub fn with_console(config: &LogConfig, console: Box<dyn Write + Send>) -> Result<Self> {
        config.validate()?;

        let console: ConsoleSink = Arc::new(Mutex::new(console));
        let counters = Arc::new(Counters::default());
        let pool = Arc::new(EntryPool::default());
        let writer = LogWriter::open(config, console.clone(), counters.clone())?;
        let path = writer.current_path();

        let (sender, receiver) = crossbeam_channel::bounded(config.buffer_size);
        let worker = Processor::new(
            receiver,
            writer,
            pool.clone(),
            config.batch_size,
            config.flush_interval(),
        )
        .spawn()
        .map_err(|e| Error::Init(format!("failed to start log writer: {}", e)))?;

        tracing::debug!(
            target: "rotalog",
            path = %path.display(),
            min_level = %config.level,
            buffer_size = config.buffer_size,
            "logger started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                sender: RwLock::new(Some(sender)),
                worker: Mutex::new(Some(worker)),
                pool,
                counters,
                console,
                level: config.level,
                dev: config.dev,
            }),
        })
    }

    /// Minimum level recorded.
    pub fn level(&self) -> Level {
        self.inner.level
    }

    /// Whether records at `level` pass the filter.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.inner.level
    }

    /// Whether the pipeline still accepts records.
    pub fn is_active(&self) -> bool {
        self.inner
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Snapshot of the pipeline counters.
    pub fn stats(&self) -> Stats {
        self.inner.counters.snapshot()
    }

    /// Submit a formatted message. Never blocks unless `level` is FATAL.
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) -> Outcome {
        let location = Location::caller();
        let outcome = self.submit(level, location.file(), location.line(), |message| {
            let _ = message.write_fmt(args);
        });
        self.escalate_if_fatal(level, outcome)
    }

    /// Submit an already rendered message.
    #[track_caller]
    pub fn submit_str(&self, level: Level, message: &str) -> Outcome {
        let location = Location::caller();
        let outcome = self.submit(level, location.file(), location.line(), |buf| {
            buf.push_str(message)
        });
        self.escalate_if_fatal(level, outcome)
    }

    /// Submit a FATAL message, then drain and close the pipeline.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> Fatal {
        let location = Location::caller();
        let outcome = self.submit(Level::Fatal, location.file(), location.line(), |message| {
            let _ = message.write_fmt(args);
        });
        self.escalate(outcome)
    }

    /// Submit an ERROR message followed by `Stack Trace:` and the current backtrace.
    #[track_caller]
    pub fn error_with_stack(&self, message: &str, err: &dyn fmt::Display) -> Outcome {
        let location = Location::caller();
        self.submit_with_stack(Level::Error, location, message, err)
    }

    /// FATAL counterpart of [`Logger::error_with_stack`].
    #[track_caller]
    pub fn fatal_with_stack(&self, message: &str, err: &dyn fmt::Display) -> Fatal {
        let location = Location::caller();
        let outcome = self.submit_with_stack(Level::Fatal, location, message, err);
        self.escalate(outcome)
    }

    /// Stop accepting records, wait until everything queued is written, and close the file.
    ///
    /// Calling this again, or from several threads, is harmless.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.close()
    }

    fn submit_with_stack(
        &self,
        level: Level,
        location: &'static Location<'static>,
        message: &str,
        err: &dyn fmt::Display,
    ) -> Outcome {
        if !self.enabled(level) {
            Counters::incr(&self.inner.counters.filtered);
            return Outcome::Filtered;
        }
        let backtrace = Backtrace::force_capture();
        self.submit(level, location.file(), location.line(), |buf| {
            let _ = write!(buf, "{}: {}\nStack Trace:\n{}", message, err, backtrace);
        })
    }

    /// Filter, capture and enqueue one record attributed to `file:line`.
    pub(crate) fn submit(
        &self,
        level: Level,
        file: &'static str,
        line: u32,
        fill: impl FnOnce(&mut String),
    ) -> Outcome {
        if !self.enabled(level) {
            Counters::incr(&self.inner.counters.filtered);
            return Outcome::Filtered;
        }

        let timestamp_nanos = now_nanos();
        let mut record = self.inner.pool.acquire();
        record.level = level;
        record.file = file;
        record.line = line;
        record.timestamp_nanos = timestamp_nanos;
        // Formatting may run user code, so it happens before taking the lock.
        fill(&mut record.message);

        let sender = self
            .inner
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            drop(sender);
            self.inner.pool.release(record);
            return Outcome::Inactive;
        };

        match tx.try_send(record) {
            Ok(()) => {
                Counters::incr(&self.inner.counters.accepted);
                Outcome::Accepted
            }
            Err(TrySendError::Full(record)) => {
                drop(sender);
                self.inner.pool.release(record);
                Counters::incr(&self.inner.counters.dropped);
                if self.inner.dev {
                    console_diagnostic(&self.inner.console, BUFFER_FULL_WARNING);
                }
                Outcome::Dropped
            }
            Err(TrySendError::Disconnected(record)) => {
                drop(sender);
                self.inner.pool.release(record);
                Outcome::Inactive
            }
        }
    }

    fn escalate_if_fatal(&self, level: Level, outcome: Outcome) -> Outcome {
        if level == Level::Fatal {
            Outcome::Fatal(self.escalate(outcome))
        } else {
            outcome
        }
    }

    fn escalate(&self, outcome: Outcome) -> Fatal {
        let recorded = outcome.is_accepted();
        tracing::error!(target: "rotalog", recorded, "fatal record submitted, shutting down logger");
        Fatal {
            recorded,
            close: self.shutdown(),
        }
    }
}
