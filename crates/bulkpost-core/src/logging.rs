//! Structured logging setup.
//!
//! Runs log to `$XDG_STATE_HOME/bulkpost/bulkpost.log` (appended, no ANSI).
//! `RUST_LOG` overrides the default filter. When the state dir is unusable the
//! CLI calls `init_logging_stderr` instead.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,bulkpost=debug,bulkpost_core=debug";
const LOG_FILE: &str = "bulkpost.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Where `init_logging` writes.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bulkpost")?;
    Ok(xdg_dirs.get_state_home().join(LOG_FILE))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Install the global subscriber writing to the default log file.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    init_logging_at(&path)?;
    Ok(path)
}

/// Install the global subscriber writing to `path`. Fails if the file cannot
/// be opened or a subscriber is already installed.
pub fn init_logging_at(path: &Path) -> Result<()> {
    let file = open_log_file(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {e}"))?;
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}

/// Stderr-only logging; a no-op if a subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
