//! Builder pattern for starting a logger.
//!
//! This module provides a convenient builder API for configuring and starting
//! a logger in a single chain of method calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use rotalog::{Level, RotationStrategy};
//!
//! let logger = rotalog::builder()
//!     .with_path("storage/logs/app.log")
//!     .with_strategy(RotationStrategy::Indexed)
//!     .with_max_lines(100_000)
//!     .with_level(Level::Info)
//!     .with_dev(true)
//!     .init()
//!     .expect("Failed to initialize logging");
//!
//! rotalog::info!(logger, "ready");
//! logger.shutdown().expect("Failed to close log file");
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Level, LogConfig, Logger, Result, RotationStrategy};

/// A builder for configuring and starting a [`Logger`].
#[derive(Debug, Clone)]
pub struct LogBuilder {
    config: LogConfig,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LogConfig::new(),
        }
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    /// Set the log file path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_path(path);
        self
    }

    /// Set the rotation strategy.
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.config = self.config.with_strategy(strategy);
        self
    }

    /// Set the size limit in bytes (`0` disables size rotation).
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.config = self.config.with_max_file_size(bytes);
        self
    }

    /// Set the line limit (`0` disables line rotation).
    pub fn with_max_lines(mut self, lines: u64) -> Self {
        self.config = self.config.with_max_lines(lines);
        self
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Set the queue capacity.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.config = self.config.with_buffer_size(size);
        self
    }

    /// Enable or disable development mode.
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.config = self.config.with_dev(dev);
        self
    }

    /// Set the number of records that forces a flush.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.config = self.config.with_batch_size(size);
        self
    }

    /// Set the periodic flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_flush_interval(interval);
        self
    }

    /// Get the current configuration without starting a logger.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Start a logger with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The log directory or initial file cannot be created
    /// - The writer thread cannot be spawned
    pub fn init(self) -> Result<Logger> {
        Logger::init(&self.config)
    }

    /// Start a logger that mirrors development output to `console`.
    pub fn init_with_console(self, console: Box<dyn Write + Send>) -> Result<Logger> {
        Logger::with_console(&self.config, console)
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
