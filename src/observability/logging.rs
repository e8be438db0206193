//! Log filter and output resolution.

use crate::config::{LogFormat, LoggingConfig};
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "FNOTE_LOG";

/// Resolved logging setup for the process.
#[derive(Debug)]
pub struct LogSettings {
    /// Filter applied to every layer.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append-only log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Resolves settings from config, the `--verbose` flag and the
    /// environment.
    #[must_use]
    #[allow(clippy::print_stderr)]
    pub fn from_config(config: &LoggingConfig, verbose: bool) -> Self {
        let env_directive = std::env::var(LOG_ENV)
            .ok()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok());
        let directive = resolve_directive(&config.level, verbose, env_directive.as_deref());

        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            // Subscriber is not installed yet.
            eprintln!("invalid log filter '{directive}': {e}");
            EnvFilter::new("warn")
        });

        Self {
            filter,
            format: config.format,
            file: config.file.clone(),
        }
    }
}

/// Picks the filter directive: environment first, then `--verbose`, then
/// the configured level.
#[must_use]
pub fn resolve_directive(level: &str, verbose: bool, env_directive: Option<&str>) -> String {
    if let Some(directive) = env_directive.map(str::trim).filter(|d| !d.is_empty()) {
        return directive.to_string();
    }
    if verbose {
        return "debug".to_string();
    }
    let level = level.trim();
    if level.is_empty() {
        "warn".to_string()
    } else {
        level.to_string()
    }
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
pub(crate) struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending, creating parent directories.
pub(crate) fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io("create log dir for", path, &e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io("open log file", path, &e))?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}
