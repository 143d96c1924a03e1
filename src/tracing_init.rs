//! Bridge from the `tracing` ecosystem into a [`Logger`].
//!
//! [`RotalogLayer`] turns each `tracing` event into a log record: TRACE and
//! DEBUG map to [`Level::Debug`], the message field becomes the message, and
//! any other fields are appended as `key=value`. Events emitted by this crate
//! itself (target `rotalog`) are skipped so writer diagnostics never loop
//! back into the pipeline.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Level, Logger, Result};

const SELF_TARGET: &str = "rotalog";

/// A `tracing_subscriber` layer that forwards events to a [`Logger`].
#[derive(Debug, Clone)]
pub struct RotalogLayer {
    logger: Logger,
}

impl RotalogLayer {
    /// Forward events to `logger`.
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

/// Collects the `message` field first and the rest as `key=value` pairs.
struct MessageVisitor<'a> {
    message: &'a mut String,
    fields: String,
}

impl Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for RotalogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        // Internal diagnostics always carry this exact target.
        if target == SELF_TARGET {
            return;
        }
        let level = map_level(metadata.level());
        let file = metadata.file().unwrap_or_else(|| metadata.target());
        let line = metadata.line().unwrap_or(0);

        let _ = self.logger.submit(level, file, line, |message| {
            let mut visitor = MessageVisitor {
                message: &mut *message,
                fields: String::new(),
            };
            event.record(&mut visitor);
            let fields = visitor.fields;
            message.push_str(&fields);
        });
    }
}

/// Install a global subscriber that forwards `tracing` events to `logger`.
///
/// `RUST_LOG` takes precedence over the logger's minimum level.
pub fn init_tracing(logger: &Logger) -> Result<()> {
    let env_filter = EnvFilter::try_new(effective_log_spec(logger.level()))
        .map_err(|e| Error::Init(e.to_string()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(RotalogLayer::new(logger.clone()))
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

/// Determine the effective filter directive, considering `RUST_LOG`.
fn effective_log_spec(level: Level) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    match level {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error | Level::Fatal => "error",
    }
    .to_string()
}
