use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rotation::deserialize_size;
use crate::{Error, Level, Result, RotationStrategy};

/// Default queue capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 100_000;
/// Default number of lines per file for the indexed strategy.
pub const DEFAULT_MAX_LINES: u64 = 100_000;
/// Default number of records that forces a flush.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;
/// Default flush tick in milliseconds.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1;

/// Configuration for a logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file path; defaults to `<cwd>/storage/logs/app.log`
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Rotation strategy ("archive" or "indexed")
    #[serde(default)]
    pub strategy: RotationStrategy,
    /// Maximum file size in bytes before rotation; `0` disables size rotation.
    /// Accepts a number of bytes or a string with units, e.g. "25M".
    #[serde(default, deserialize_with = "deserialize_size")]
    pub max_file_size: Option<u64>,
    /// Maximum lines per file (indexed strategy only); `0` disables line rotation
    #[serde(default = "default_max_lines")]
    pub max_lines: u64,
    /// Minimum level recorded
    #[serde(default)]
    pub level: Level,
    /// Capacity of the ingestion queue
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Development mode: mirror output to the console with colors
    #[serde(default, alias = "is_dev")]
    pub dev: bool,
    /// Number of pending records that forces an immediate flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Interval of the periodic flush in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            path: None,
            strategy: RotationStrategy::default(),
            max_file_size: None,
            max_lines: default_max_lines(),
            level: Level::default(),
            buffer_size: default_buffer_size(),
            dev: false,
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }

    /// Set the log file path
    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the rotation strategy
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the maximum file size in bytes
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set the maximum lines per file
    pub fn with_max_lines(mut self, lines: u64) -> Self {
        self.max_lines = lines;
        self
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the queue capacity
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Enable development mode
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Set the flush high-water mark
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the periodic flush interval
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    /// Check values that would make the pipeline unusable.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be greater than 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".to_string()));
        }
        if self.flush_interval_ms == 0 {
            return Err(Error::Config(
                "flush_interval_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.path
            && path.file_name().is_none()
        {
            return Err(Error::Config(format!(
                "log path has no file name: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// The configured path, or the default under `cwd`.
    pub fn resolved_path(&self, cwd: &Path) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => default_path(cwd),
        }
    }

    /// Effective size limit; `None` when size rotation is disabled.
    pub fn effective_max_file_size(&self) -> Option<u64> {
        match self.max_file_size {
            None => Some(self.strategy.default_max_size()),
            Some(0) => None,
            Some(n) => Some(n),
        }
    }

    /// Effective line limit; `None` when line rotation is disabled or unsupported.
    pub fn effective_max_lines(&self) -> Option<u64> {
        if self.strategy.supports_line_limit() && self.max_lines > 0 {
            Some(self.max_lines)
        } else {
            None
        }
    }

    /// Periodic flush interval.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Default log file location under `cwd`.
pub fn default_path(cwd: &Path) -> PathBuf {
    cwd.join("storage").join("logs").join("app.log")
}

fn default_max_lines() -> u64 {
    DEFAULT_MAX_LINES
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_new() {
        let config = LogConfig::new();
        assert!(config.path.is_none());
        assert_eq!(config.strategy, RotationStrategy::Indexed);
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.buffer_size, 100_000);
        assert_eq!(config.max_lines, 100_000);
        assert_eq!(config.batch_size, 50_000);
        assert_eq!(config.flush_interval(), Duration::from_millis(1));
        assert!(!config.dev);
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::new()
            .with_path("logs/app.log")
            .with_strategy(RotationStrategy::Archive)
            .with_max_file_size(2048)
            .with_max_lines(10)
            .with_level(Level::Warn)
            .with_buffer_size(16)
            .with_dev(true)
            .with_batch_size(4)
            .with_flush_interval(Duration::from_millis(5));
        assert_eq!(config.path, Some(PathBuf::from("logs/app.log")));
        assert_eq!(config.strategy, RotationStrategy::Archive);
        assert_eq!(config.max_file_size, Some(2048));
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.buffer_size, 16);
        assert!(config.dev);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.flush_interval_ms, 5);
    }

    #[test]
    fn test_effective_max_file_size_defaults_per_strategy() {
        let indexed = LogConfig::new();
        assert_eq!(indexed.effective_max_file_size(), Some(100 * 1024 * 1024));
        let archive = LogConfig::new().with_strategy(RotationStrategy::Archive);
        assert_eq!(archive.effective_max_file_size(), Some(25 * 1024 * 1024));
        let disabled = LogConfig::new().with_max_file_size(0);
        assert_eq!(disabled.effective_max_file_size(), None);
    }

    #[test]
    fn test_effective_max_lines() {
        assert_eq!(LogConfig::new().effective_max_lines(), Some(100_000));
        assert_eq!(LogConfig::new().with_max_lines(0).effective_max_lines(), None);
        let archive = LogConfig::new()
            .with_strategy(RotationStrategy::Archive)
            .with_max_lines(3);
        assert_eq!(archive.effective_max_lines(), None);
    }

    #[test]
    fn test_validate() {
        assert!(LogConfig::new().validate().is_ok());
        assert!(LogConfig::new().with_buffer_size(0).validate().is_err());
        assert!(LogConfig::new().with_batch_size(0).validate().is_err());
        assert!(LogConfig::new().with_path("/").validate().is_err());
    }

    #[test]
    fn test_resolved_path_default() {
        let cwd = Path::new("/srv/app");
        assert_eq!(
            LogConfig::new().resolved_path(cwd),
            PathBuf::from("/srv/app/storage/logs/app.log")
        );
        assert_eq!(
            LogConfig::new().with_path("x.log").resolved_path(cwd),
            PathBuf::from("x.log")
        );
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
path: /var/log/svc/app.log
strategy: archive
max_file_size: "5M"
level: WARN
buffer_size: 1000
is_dev: true
"#;
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.path, Some(PathBuf::from("/var/log/svc/app.log")));
        assert_eq!(config.strategy, RotationStrategy::Archive);
        assert_eq!(config.max_file_size, Some(5 * 1024 * 1024));
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.buffer_size, 1000);
        assert!(config.dev);
        assert_eq!(config.max_lines, 100_000);
    }

    #[test]
    fn test_deserialize_toml() {
        let toml_str = r#"
strategy = "indexed"
max_file_size = 4096
max_lines = 3
level = "info"
"#;
        let config: LogConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.strategy, RotationStrategy::Indexed);
        assert_eq!(config.max_file_size, Some(4096));
        assert_eq!(config.max_lines, 3);
        assert_eq!(config.level, Level::Info);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_deserialize_rejects_bad_size() {
        let yaml = "max_file_size: \"12Q\"\n";
        assert!(serde_yaml::from_str::<LogConfig>(yaml).is_err());
    }
}
