use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use time::UtcOffset;

use crate::record::Renderer;
use crate::rotation::RotationState;
use crate::stats::Counters;
use crate::{Error, LogConfig, LogRecord, Result};

/// Destination for development-mode console output.
pub type ConsoleSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Initial capacity of the per-batch render buffer.
const BATCH_BUFFER_CAPACITY: usize = 64 * 1024;

/// State of the currently open log file.
#[derive(Debug)]
pub struct LoggerState {
    /// The open file handle.
    pub file: File,
    /// Location of the open file and how to pick the next one.
    pub rotation: RotationState,
    /// Bytes written to the open file.
    pub size: u64,
    /// Lines written to the open file.
    pub lines: u64,
}

/// Write a one-line diagnostic to the console sink.
pub(crate) fn console_diagnostic(console: &ConsoleSink, message: &str) {
    let mut sink = console.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = writeln!(sink, "{}", message);
    let _ = sink.flush();
}

/// Renders batches into the active log file and rotates it when full.
pub struct LogWriter {
    state: LoggerState,
    max_size: Option<u64>,
    max_lines: Option<u64>,
    dev: bool,
    renderer: Renderer,
    console: ConsoleSink,
    counters: Arc<Counters>,
    buf: Vec<u8>,
    console_buf: Vec<u8>,
    // Records rendered into `buf` but not yet written.
    pending: u64,
    // Set when a rotation failed during the current batch.
    rotation_failed: bool,
}

impl LogWriter {
    /// Open the initial log file described by `config`.
    pub(crate) fn open(
        config: &LogConfig,
        console: ConsoleSink,
        counters: Arc<Counters>,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().ok();
        let path = match (&config.path, &cwd) {
            (Some(path), _) => path.clone(),
            (None, Some(cwd)) => config.resolved_path(cwd),
            (None, None) => {
                return Err(Error::Init(
                    "no log path configured and working directory is unavailable".to_string(),
                ));
            }
        };

        let rotation = RotationState::start(config.strategy, &path);
        let (file, size) = rotation.open_initial()?;
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

        tracing::debug!(
            target: "rotalog",
            path = %rotation.current_path().display(),
            size,
            "opened log file"
        );

        Ok(Self {
            state: LoggerState {
                file,
                rotation,
                size,
                lines: 0,
            },
            max_size: config.effective_max_file_size(),
            max_lines: config.effective_max_lines(),
            dev: config.dev,
            renderer: Renderer::new(offset, cwd),
            console,
            counters,
            buf: Vec::with_capacity(BATCH_BUFFER_CAPACITY),
            console_buf: Vec::new(),
            pending: 0,
            rotation_failed: false,
        })
    }

    /// Path of the file currently written to.
    pub fn current_path(&self) -> PathBuf {
        self.state.rotation.current_path()
    }

    /// Write a batch in arrival order, rotating as limits are reached.
    ///
    /// Reaching the line limit ends the current file immediately, so a batch can
    /// be spread over several files. The size limit is checked once the batch
    /// is written. A failed rotation is retried at most once per batch; until
    /// then the rest of the batch goes to the current file.
    pub fn write_batch(&mut self, batch: &[LogRecord]) {
        if batch.is_empty() {
            return;
        }
        self.rotation_failed = false;

        for record in batch {
            if let Err(e) = self.renderer.render_plain(record, &mut self.buf) {
                self.report(&format!("Error formatting log record: {}", e));
                continue;
            }
            if self.dev {
                let _ = self.renderer.render_console(record, &mut self.console_buf);
            }
            self.pending += 1;
            self.state.lines += 1;

            if let Some(max_lines) = self.max_lines
                && self.state.lines >= max_lines
                && !self.rotation_failed
            {
                self.flush_segment();
                self.rotate();
            }
        }

        self.flush_segment();
        if let Some(max_size) = self.max_size
            && self.state.size >= max_size
            && !self.rotation_failed
        {
            self.rotate();
        }
    }

    /// Write everything rendered so far with a single call.
    fn flush_segment(&mut self) {
        self.flush_console();
        if self.buf.is_empty() {
            return;
        }
        match self.state.file.write_all(&self.buf) {
            Ok(()) => {
                self.state.size += self.buf.len() as u64;
                Counters::add(&self.counters.written, self.pending);
            }
            Err(e) => {
                Counters::incr(&self.counters.write_errors);
                self.report(&format!("Error writing to log file: {}", e));
            }
        }
        self.buf.clear();
        self.pending = 0;
    }

    fn flush_console(&mut self) {
        if self.console_buf.is_empty() {
            return;
        }
        let mut sink = self.console.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.write_all(&self.console_buf);
        let _ = sink.flush();
        self.console_buf.clear();
    }

    /// Switch to the next file; on failure keep writing to the current one.
    fn rotate(&mut self) {
        match self.state.rotation.rotate() {
            Ok(file) => {
                self.state.file = file;
                self.state.size = 0;
                self.state.lines = 0;
                Counters::incr(&self.counters.rotations);
                tracing::debug!(
                    target: "rotalog",
                    path = %self.state.rotation.current_path().display(),
                    "rotated log file"
                );
            }
            Err(e) => {
                self.rotation_failed = true;
                self.report(&format!("Error rotating log file: {}", e));
            }
        }
    }

    fn report(&self, message: &str) {
        tracing::warn!(target: "rotalog", "{}", message);
        if self.dev {
            console_diagnostic(&self.console, message);
        }
    }

    /// Flush the file to disk; the handle is closed when the writer is dropped.
    pub fn close(mut self) -> io::Result<()> {
        self.state.file.flush()?;
        match self.state.file.sync_all() {
            // Character devices such as `/dev/stdout` cannot be synced.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            result => result,
        }
    }
}
