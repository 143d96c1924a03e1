//! # Rotalog
//!
//! An in-process logging pipeline with batched writes and file rotation.
//!
//! ## Features
//!
//! - Non-blocking submission from any thread; records are dropped, not
//!   waited on, when the queue is full
//! - A single writer thread that batches records and flushes them on a size
//!   or time trigger
//! - Rotation by file size or line count, either by moving the file into an
//!   `archive/` directory or by opening the next `<base>.<n>.log`
//! - Colored console mirroring in development mode
//! - Optional bridge from the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! use rotalog::{Level, LogConfig, Logger};
//!
//! let config = LogConfig::new()
//!     .with_path("storage/logs/app")
//!     .with_level(Level::Info)
//!     .with_max_lines(100_000);
//! let logger = Logger::init(&config)?;
//!
//! rotalog::info!(logger, "Server started on port {}", 8080);
//! rotalog::error!(logger, "Database error: {}", "connection refused");
//!
//! logger.shutdown()?;
//! # Ok::<(), rotalog::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod level;
pub mod logger;
mod macros;
pub mod pool;
mod processor;
pub mod record;
pub mod rotation;
mod stats;
mod writer;

#[cfg(feature = "tracing-integration")]
pub mod tracing_init;

pub use builder::LogBuilder;
pub use config::LogConfig;
pub use error::{Error, Result};
pub use level::Level;
pub use logger::{Fatal, Logger, Outcome};
pub use pool::EntryPool;
pub use record::LogRecord;
pub use rotation::RotationStrategy;
pub use stats::Stats;

#[cfg(feature = "tracing-integration")]
pub use tracing_init::{RotalogLayer, init_tracing};

/// Start configuring a logger with the builder API.
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
