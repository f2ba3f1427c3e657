//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "pokedex.log";
const DEFAULT_FILTER: &str = "pokedex=info";

/// `<platform cache dir>/pokedex`, or the working directory when the
/// platform has none.
pub fn default_log_dir() -> PathBuf {
    dirs_next::cache_dir()
        .map(|dir| dir.join("pokedex"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| io::Error::other(format!("logging init failed: {err}")))?;

    Ok(guard)
}

/// Like [`init`], but a log directory that cannot be used only costs the
/// log file. Runs before raw mode, so the warning lands on stderr.
pub fn init_or_warn(log_dir: &Path) -> Option<WorkerGuard> {
    match init(log_dir) {
        Ok(guard) => Some(guard),
        Err(error) => {
            eprintln!(
                "Warning: logging disabled, could not open {}: {}",
                log_dir.display(),
                error
            );
            None
        }
    }
}
