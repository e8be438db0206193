//! Typed configuration sections.

use crate::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Default reminder scan interval.
const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(60);

/// Backup account credentials.
#[derive(Debug, Clone, Default)]
pub struct AccountConfig {
    /// Account name.
    pub username: Option<String>,
    /// Account password. Only ever used to derive the backup key.
    pub password: Option<SecretString>,
}

/// Available backup backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupBackend {
    /// Backup disabled.
    #[default]
    None,
    /// Redis sorted set.
    Redis,
    /// One JSON file per entry in a directory.
    Filesystem,
}

impl BackupBackend {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "redis" => Ok(Self::Redis),
            "filesystem" | "fs" | "file" => Ok(Self::Filesystem),
            other => Err(Error::Config {
                cause: format!("unknown backup backend: {other}"),
            }),
        }
    }
}

/// Backup backend configuration.
#[derive(Debug, Clone, Default)]
pub struct BackupConfig {
    /// Selected backend.
    pub backend: BackupBackend,
    /// Redis connection URL.
    pub url: Option<String>,
    /// Directory for the filesystem backend.
    pub path: Option<PathBuf>,
}

/// To-do reminder configuration.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Whether the periodic scan runs.
    pub enabled: bool,
    /// Time between scans.
    pub interval: Duration,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: DEFAULT_REMINDER_INTERVAL,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::Config {
                cause: format!("unknown log format: {other}"),
            }),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive (`EnvFilter` syntax).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_backend_parse() {
        assert_eq!(BackupBackend::parse("Redis").unwrap(), BackupBackend::Redis);
        assert_eq!(BackupBackend::parse("fs").unwrap(), BackupBackend::Filesystem);
        assert_eq!(BackupBackend::parse("").unwrap(), BackupBackend::None);
        assert!(BackupBackend::parse("s3").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty").unwrap(), LogFormat::Pretty);
        assert!(LogFormat::parse("yaml").is_err());
    }
}
