use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Where diagnostic events go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// No subscriber is installed
    Disabled,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// The TUI owns the terminal, so it only logs to a file. Headless runs
    /// fall back to stderr, keeping stdout for records.
    pub fn resolve(headless: bool, log_file: Option<PathBuf>) -> Self {
        match (log_file, headless) {
            (Some(path), _) => LogTarget::File(path),
            (None, true) => LogTarget::Stderr,
            (None, false) => LogTarget::Disabled,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the background writer when dropped; keep it
/// alive until the program exits.
pub fn init_logging(target: &LogTarget) -> anyhow::Result<Option<WorkerGuard>> {
    match target {
        LogTarget::Disabled => Ok(None),
        LogTarget::Stderr => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            install(writer, true)?;
            Ok(Some(guard))
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            install(writer, false)?;
            Ok(Some(guard))
        }
    }
}

fn install(writer: tracing_appender::non_blocking::NonBlocking, ansi: bool) -> anyhow::Result<()> {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))
}
