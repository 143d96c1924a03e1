//! Log records and their textual forms.
//!
//! A record is rendered twice at most: once in plain form for the log file and,
//! in development mode, once more with the level wrapped in ANSI color codes
//! for the console. Rendering depends only on the record, the UTC offset and
//! the working directory fixed at startup, so it is repeatable.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::{Level, Result};

/// Initial message capacity of a pooled record.
pub const MESSAGE_CAPACITY: usize = 1024;

/// A single log message travelling through the pipeline.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity.
    pub level: Level,
    /// Fully formatted message text.
    pub message: String,
    /// Source file of the call site.
    pub file: &'static str,
    /// Source line of the call site.
    pub line: u32,
    /// Wall-clock capture time in nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
}

impl LogRecord {
    /// Create an empty record with preallocated message capacity.
    pub fn new() -> Self {
        Self {
            level: Level::Debug,
            message: String::with_capacity(MESSAGE_CAPACITY),
            file: "",
            line: 0,
            timestamp_nanos: 0,
        }
    }

    /// Clear the content while keeping the message allocation.
    pub fn reset(&mut self) {
        self.level = Level::Debug;
        self.message.clear();
        self.file = "";
        self.line = 0;
        self.timestamp_nanos = 0;
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos()).unwrap_or(i64::MAX)
}

/// Renders records into file and console lines.
#[derive(Debug)]
pub struct Renderer {
    offset: UtcOffset,
    cwd: Option<PathBuf>,
    // Last rendered second and its formatted form; batches mostly share one.
    cached: Option<(i64, String)>,
}

impl Renderer {
    /// Create a renderer for the given offset, relativizing paths against `cwd`.
    pub fn new(offset: UtcOffset, cwd: Option<PathBuf>) -> Self {
        Self {
            offset,
            cwd,
            cached: None,
        }
    }

    /// Append the file form: `YYYY/MM/DD HH:MM:SS [LEVEL] [path:line] message\n`.
    pub fn render_plain(&mut self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()> {
        self.render(record, out, false)
    }

    /// Append the console form, identical to the file form except for a colored level.
    pub fn render_console(&mut self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()> {
        self.render(record, out, true)
    }

    fn render(&mut self, record: &LogRecord, out: &mut Vec<u8>, color: bool) -> Result<()> {
        let path = self.display_path(record.file);
        let timestamp = self.timestamp(record.timestamp_nanos)?;
        if color {
            writeln!(
                out,
                "{} [{}{}{}] [{}:{}] {}",
                timestamp,
                record.level.color(),
                record.level.as_str(),
                Level::reset(),
                path,
                record.line,
                record.message
            )?;
        } else {
            writeln!(
                out,
                "{} [{}] [{}:{}] {}",
                timestamp,
                record.level.as_str(),
                path,
                record.line,
                record.message
            )?;
        }
        Ok(())
    }

    fn timestamp(&mut self, nanos: i64) -> Result<&str> {
        let secs = nanos.div_euclid(1_000_000_000);
        let fresh = !matches!(&self.cached, Some((cached, _)) if *cached == secs);
        if fresh {
            let datetime = OffsetDateTime::from_unix_timestamp(secs)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH)
                .to_offset(self.offset);
            let formatted =
                datetime.format(format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"))?;
            self.cached = Some((secs, formatted));
        }
        Ok(self.cached.as_ref().map(|(_, s)| s.as_str()).unwrap_or_default())
    }

    fn display_path<'a>(&self, file: &'a str) -> Cow<'a, str> {
        let path = Path::new(file);
        if path.is_absolute()
            && let Some(cwd) = &self.cwd
            && let Ok(relative) = path.strip_prefix(cwd)
        {
            return Cow::Owned(relative.to_string_lossy().into_owned());
        }
        Cow::Borrowed(file)
    }
}
