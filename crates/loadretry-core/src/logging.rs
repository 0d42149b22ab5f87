//! Logging setup. Retry decisions are logged through `tracing`; the CLI sends
//! them to `$XDG_STATE_HOME/loadretry/loadretry.log`, or stderr if that fails.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "loadretry.log";

/// Used when `RUST_LOG` is unset or unparsable. Retry/give-up lines are debug/warn.
const DEFAULT_FILTER: &str = "info,loadretry=debug,loadretry_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `dir/loadretry.log` for appending, creating `dir` if needed.
pub fn open_log_file(dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    Ok((path, file))
}

/// Install the global subscriber writing to `dir/loadretry.log`.
/// Fails if the file can't be opened or a subscriber is already set.
pub fn init_logging_at(dir: &Path) -> Result<PathBuf> {
    let (path, file) = open_log_file(dir)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!("logging to {}", path.display());
    Ok(path)
}

/// Log to the XDG state dir. On error the caller should fall back to
/// `init_logging_stderr`.
pub fn init_logging() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("loadretry")?;
    init_logging_at(&dirs.get_state_home())
}

pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn log_file_is_created_with_its_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("state").join("loadretry");
        let (path, _file) = open_log_file(&dir).unwrap();
        assert_eq!(path, dir.join(LOG_FILE_NAME));
        assert!(path.is_file());
    }

    #[test]
    fn reopening_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let (path, mut first) = open_log_file(tmp.path()).unwrap();
        writeln!(first, "first run").unwrap();
        drop(first);
        let (_, mut second) = open_log_file(tmp.path()).unwrap();
        writeln!(second, "second run").unwrap();
        drop(second);
        assert_eq!(fs::read_to_string(path).unwrap(), "first run\nsecond run\n");
    }
}
