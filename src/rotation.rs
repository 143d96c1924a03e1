use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, de};

/// Default size limit for the archive strategy (25 MiB).
pub const ARCHIVE_DEFAULT_MAX_SIZE: u64 = 25 * 1024 * 1024;
/// Default size limit for the indexed strategy (100 MiB).
pub const INDEXED_DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;
/// Name of the directory rotated files are moved into by the archive strategy.
pub const ARCHIVE_DIR: &str = "archive";

/// Parse a size string with an optional unit (K/M/G, case-insensitive); no unit means bytes.
pub(crate) fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, multiplier) = if last.is_alphabetic() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            unit => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
        };
        (&s[..s.len() - last.len_utf8()], multiplier)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number of bytes or a string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

/// Deserialize an optional size given as bytes or as a string like `"25M"`.
pub(crate) fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<SizeValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeValue::Number(n)) => Ok(Some(n)),
        Some(SizeValue::String(s)) => parse_size(&s).map(Some).map_err(de::Error::custom),
    }
}

/// How a full log file is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Keep writing to a fixed path; on rotation move the file to
    /// `archive/<n>.log` next to it and start over.
    Archive,
    /// Never rename; each rotation opens `<base>.<n+1>.log`.
    #[default]
    Indexed,
}

impl RotationStrategy {
    /// Size limit used when none is configured.
    pub fn default_max_size(&self) -> u64 {
        match self {
            Self::Archive => ARCHIVE_DEFAULT_MAX_SIZE,
            Self::Indexed => INDEXED_DEFAULT_MAX_SIZE,
        }
    }

    /// Whether line-count rotation applies to this strategy.
    pub fn supports_line_limit(&self) -> bool {
        matches!(self, Self::Indexed)
    }

    /// Normalize a configured path: the indexed strategy drops any extension.
    pub fn base_path(&self, path: &Path) -> PathBuf {
        match self {
            Self::Archive => path.to_path_buf(),
            Self::Indexed => path.with_extension(""),
        }
    }
}

/// Largest `N` among files named `<prefix>N<suffix>` in `dir`; 0 when none or unreadable.
fn max_numbered(dir: &Path, prefix: &str, suffix: &str) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().into_string().ok()?;
            name.strip_prefix(prefix)?
                .strip_suffix(suffix)?
                .parse::<u64>()
                .ok()
        })
        .max()
        .unwrap_or(0)
}

/// Highest index among existing `<base>.N.log` files.
pub fn scan_indexed(base: &Path) -> u64 {
    let dir = parent_dir(base);
    let prefix = match base.file_name() {
        Some(name) => format!("{}.", name.to_string_lossy()),
        None => return 0,
    };
    max_numbered(&dir, &prefix, ".log")
}

/// Highest `N` among existing `N.log` files in an archive directory.
pub fn scan_archive(archive_dir: &Path) -> u64 {
    max_numbered(archive_dir, "", ".log")
}

/// Path of the `index`-th file of the indexed sequence.
pub fn indexed_path(base: &Path, index: u64) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.log", index));
    base.with_file_name(name)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Where the active file lives and how the next one is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationState {
    /// Fixed current file plus its archive directory.
    Archive {
        /// Path of the file being written.
        current: PathBuf,
        /// Directory rotated files are moved into.
        archive_dir: PathBuf,
    },
    /// Base path (no extension) plus the index of the open file.
    Indexed {
        /// Base path the index is appended to.
        base: PathBuf,
        /// Index of the open file.
        index: u64,
    },
}

impl RotationState {
    /// Resolve the starting state, scanning existing files for the indexed strategy.
    pub fn start(strategy: RotationStrategy, path: &Path) -> Self {
        let path = strategy.base_path(path);
        match strategy {
            RotationStrategy::Archive => {
                let archive_dir = parent_dir(&path).join(ARCHIVE_DIR);
                Self::Archive {
                    current: path,
                    archive_dir,
                }
            }
            RotationStrategy::Indexed => {
                let index = scan_indexed(&path) + 1;
                Self::Indexed { base: path, index }
            }
        }
    }

    /// Path of the file currently written to.
    pub fn current_path(&self) -> PathBuf {
        match self {
            Self::Archive { current, .. } => current.clone(),
            Self::Indexed { base, index } => indexed_path(base, *index),
        }
    }

    /// Open the initial file, creating its directory, and report its current size.
    pub fn open_initial(&self) -> io::Result<(File, u64)> {
        let path = self.current_path();
        fs::create_dir_all(parent_dir(&path))?;
        let file = open_append(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok((file, size))
    }

    /// Retire the active file and open its successor.
    ///
    /// On error the state is left as it was and the caller keeps its handle.
    pub fn rotate(&mut self) -> io::Result<File> {
        match self {
            Self::Archive {
                current,
                archive_dir,
            } => {
                fs::create_dir_all(&*archive_dir)?;
                if current.exists() {
                    let next = scan_archive(archive_dir) + 1;
                    fs::rename(&*current, archive_dir.join(format!("{}.log", next)))?;
                }
                open_append(current)
            }
            Self::Indexed { base, index } => {
                let file = open_append(&indexed_path(base, *index + 1))?;
                *index += 1;
                Ok(file)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("2k").unwrap(), 2 * 1024);
        assert_eq!(parse_size("25M").unwrap(), 25 * 1024 * 1024);
        assert_eq!(parse_size(" 1G ").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("").is_err());
        assert!(parse_size("10X").is_err());
        assert!(parse_size("abcM").is_err());
        assert!(parse_size("99999999999999G").is_err());
    }

    #[test]
    fn test_base_path_per_strategy() {
        let path = Path::new("logs/app.log");
        assert_eq!(
            RotationStrategy::Archive.base_path(path),
            PathBuf::from("logs/app.log")
        );
        assert_eq!(
            RotationStrategy::Indexed.base_path(path),
            PathBuf::from("logs/app")
        );
        assert_eq!(
            RotationStrategy::Indexed.base_path(Path::new("logs/app")),
            PathBuf::from("logs/app")
        );
    }

    #[test]
    fn test_indexed_path() {
        assert_eq!(
            indexed_path(Path::new("logs/app"), 3),
            PathBuf::from("logs/app.3.log")
        );
    }

    #[test]
    fn test_scan_indexed_picks_max() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["app.1.log", "app.7.log", "app.3.log", "app.x.log", "other.9.log"] {
            File::create(dir.path().join(name)).unwrap();
        }
        assert_eq!(scan_indexed(&dir.path().join("app")), 7);
        assert_eq!(scan_indexed(&dir.path().join("none")), 0);
    }

    #[test]
    fn test_scan_archive_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(scan_archive(&dir.path().join("archive")), 0);
    }

    #[test]
    fn test_indexed_start_continues_sequence() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("app.2.log")).unwrap();
        let state = RotationState::start(RotationStrategy::Indexed, &dir.path().join("app.log"));
        assert_eq!(state.current_path(), dir.path().join("app.3.log"));
    }

    #[test]
    fn test_indexed_rotate_increments() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = RotationState::start(RotationStrategy::Indexed, &dir.path().join("app"));
        state.open_initial().unwrap();
        state.rotate().unwrap();
        assert_eq!(state.current_path(), dir.path().join("app.2.log"));
        assert!(dir.path().join("app.1.log").exists());
        assert!(dir.path().join("app.2.log").exists());
    }

    #[test]
    fn test_archive_rotate_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("app.log");
        let mut state = RotationState::start(RotationStrategy::Archive, &current);
        state.open_initial().unwrap();
        std::fs::write(&current, "first\n").unwrap();

        state.rotate().unwrap();
        state.rotate().unwrap();

        let archive = dir.path().join("archive");
        assert_eq!(std::fs::read_to_string(archive.join("1.log")).unwrap(), "first\n");
        assert!(archive.join("2.log").exists());
        assert!(current.exists());
        assert_eq!(state.current_path(), current);
    }

    #[test]
    fn test_archive_rotate_continues_after_existing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(&archive).unwrap();
        File::create(archive.join("4.log")).unwrap();

        let current = dir.path().join("app.log");
        let mut state = RotationState::start(RotationStrategy::Archive, &current);
        state.open_initial().unwrap();
        state.rotate().unwrap();
        assert!(archive.join("5.log").exists());
    }

    #[test]
    fn test_failed_rotation_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app");
        let mut state = RotationState::start(RotationStrategy::Indexed, &base);
        state.open_initial().unwrap();
        // A directory squatting on the next file name makes the open fail.
        std::fs::create_dir_all(dir.path().join("app.2.log")).unwrap();
        assert!(state.rotate().is_err());
        assert_eq!(state.current_path(), dir.path().join("app.1.log"));
    }
}
