//! # fnote
//!
//! A personal note store that keeps `key:value` records in a local flat file
//! and mirrors the whole file to an optional remote backup.
//!
//! ## Features
//!
//! - One note per line, split at the first `:` into key and value
//! - Fuzzy (all tokens, case-insensitive) and exact key lookup
//! - Delete with optional confirmation, replace-by-key modify
//! - Background reconciliation against a timestamp-scored backup
//!   (Redis sorted set or JSON entry files on a shared filesystem)
//! - To-do reminders driven by `remind@` markers in note values
//!
//! ## Example
//!
//! ```rust,ignore
//! use fnote::io::StdTerminal;
//! use fnote::{Note, NoteConfig, NoteContext};
//! use std::sync::Arc;
//!
//! let context = NoteContext::open(&NoteConfig::load(None)?, Arc::new(StdTerminal::new()));
//! let store = context.store();
//! store.add(&Note::from_line("wifi:hunter2"))?;
//! let hits = store.find("wifi", true, true, false)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::NoteConfig;
pub use models::{BackupEntry, Note, SyncAction, SyncEvent, parse_key, parse_value};
pub use services::{NoteContext, NoteStore, ReminderService, SyncService};
pub use storage::{BackupClient, NoteFile, WriteMode};

/// Error type for fnote operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Io` | The note file (or a backup entry file) cannot be created, read or written |
/// | `Serialization` | A backup payload is not a JSON array of strings |
/// | `Backup` | The remote backup store rejects or cannot serve a request |
/// | `DuplicateKey` | `add` is called for a key that is already present |
/// | `InvalidInput` | A command line or REPL input cannot be interpreted |
/// | `Config` | The configuration file cannot be read or parsed |
/// | `FeatureNotEnabled` | A backend was configured that is compiled out |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A local file operation failed.
    #[error("{operation} {} failed: {cause}", path.display())]
    Io {
        /// The operation that failed.
        operation: String,
        /// The file the operation targeted.
        path: PathBuf,
        /// The underlying cause.
        cause: String,
    },

    /// A backup payload could not be encoded or decoded.
    ///
    /// Raised when:
    /// - The latest backup entry is not a JSON array of strings
    /// - A filesystem backup entry file is corrupt
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A remote backup operation failed.
    #[error("backup operation '{operation}' failed: {cause}")]
    Backup {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The key of a note being added already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("config error: {cause}")]
    Config {
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Builds an [`Error::Io`] for `path`.
    pub fn io(operation: &str, path: &Path, cause: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    /// Builds an [`Error::Backup`].
    pub fn backup(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::Backup {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for fnote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds, with sub-second precision.
#[must_use]
pub fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::Backup {
            operation: "zadd".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "backup operation 'zadd' failed: connection refused"
        );

        let err = Error::io(
            "open",
            Path::new("/tmp/notes.txt"),
            &std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().starts_with("open /tmp/notes.txt failed:"));

        let err = Error::DuplicateKey("wifi".to_string());
        assert_eq!(err.to_string(), "duplicate key: wifi");
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        assert!(current_timestamp() > 1_600_000_000.0);
    }
}
