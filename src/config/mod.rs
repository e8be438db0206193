//! Configuration management.
//!
//! Configuration is read from a TOML file:
//!
//! ```toml
//! note_path = "/home/me/FIND.txt"
//!
//! [account]
//! username = "me"
//! password = "secret"
//!
//! [backup]
//! backend = "redis"            # "redis", "filesystem" or "none"
//! url = "redis://127.0.0.1:6379/0"
//! path = "/mnt/share/fnote"    # filesystem backend only
//!
//! [reminder]
//! enabled = true
//! interval_seconds = 60
//!
//! [logging]
//! level = "info"
//! format = "pretty"            # or "json"
//! file = "/home/me/.local/state/fnote/fnote.log"
//! ```
//!
//! Backup is enabled only when a backend and both account fields are set.

mod settings;

pub use settings::{
    AccountConfig, BackupBackend, BackupConfig, LogFormat, LoggingConfig, ReminderConfig,
};

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "FNOTE_CONFIG_PATH";

/// Environment variable overriding the note file location.
pub const NOTE_PATH_ENV: &str = "FNOTE_NOTE_PATH";

/// Prefix of the derived backup key.
const BACKUP_KEY_PREFIX: &str = "fnote:backup:";

/// Main configuration for fnote.
#[derive(Debug, Clone)]
pub struct NoteConfig {
    /// Path to the note file.
    pub note_path: PathBuf,
    /// Backup account credentials.
    pub account: AccountConfig,
    /// Backup backend configuration.
    pub backup: BackupConfig,
    /// Reminder configuration.
    pub reminder: ReminderConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Note file path.
    pub note_path: Option<String>,
    /// Account section.
    pub account: Option<ConfigFileAccount>,
    /// Backup section.
    pub backup: Option<ConfigFileBackup>,
    /// Reminder section.
    pub reminder: Option<ConfigFileReminder>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Account section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileAccount {
    /// Account name.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
}

/// Backup section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileBackup {
    /// Backend name.
    pub backend: Option<String>,
    /// Redis connection URL.
    pub url: Option<String>,
    /// Directory for the filesystem backend.
    pub path: Option<String>,
}

/// Reminder section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileReminder {
    /// Whether the reminder runs.
    pub enabled: Option<bool>,
    /// Scan interval.
    pub interval_seconds: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive, e.g. `info` or `fnote=debug`.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            note_path: default_note_path(),
            account: AccountConfig::default(),
            backup: BackupConfig::default(),
            reminder: ReminderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NoteConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            cause: format!("read {}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or holds invalid values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::Config {
            cause: format!("parse config: {e}"),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/fnote/` on macOS)
    /// 2. XDG config dir (`~/.config/fnote/` for Unix compatibility)
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("fnote").join("config.toml");
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("fnote")
            .join("config.toml");

        for candidate in [platform_config, xdg_config] {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %candidate.display(), "Ignoring config file: {e}"),
            }
        }

        Self::default()
    }

    /// Loads configuration from `path`, the `FNOTE_CONFIG_PATH` environment
    /// variable, or the default location, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            Self::load_from_file(path)?
        } else if let Some(path) = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            Self::load_from_file(Path::new(&path))?
        } else {
            Self::load_default()
        };

        if let Some(note_path) = std::env::var(NOTE_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            config.note_path = PathBuf::from(note_path);
        }

        Ok(config)
    }

    /// Converts a `ConfigFile` to `NoteConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(note_path) = file.note_path {
            config.note_path = expand_home(&note_path);
        }
        if let Some(account) = file.account {
            config.account.username = account.username.filter(|u| !u.is_empty());
            config.account.password = account
                .password
                .filter(|p| !p.is_empty())
                .map(SecretString::from);
        }
        if let Some(backup) = file.backup {
            if let Some(backend) = backup.backend {
                config.backup.backend = BackupBackend::parse(&backend)?;
            }
            config.backup.url = backup.url.filter(|u| !u.is_empty());
            config.backup.path = backup.path.as_deref().map(expand_home);
        }
        if let Some(reminder) = file.reminder {
            if let Some(enabled) = reminder.enabled {
                config.reminder.enabled = enabled;
            }
            if let Some(seconds) = reminder.interval_seconds {
                if seconds == 0 {
                    return Err(Error::Config {
                        cause: "reminder.interval_seconds must be positive".to_string(),
                    });
                }
                config.reminder.interval = Duration::from_secs(seconds);
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format)?;
            }
            config.logging.file = logging.file.as_deref().map(expand_home);
        }

        Ok(config)
    }

    /// Sets the note file path.
    #[must_use]
    pub fn with_note_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.note_path = path.into();
        self
    }

    /// Sets the backup backend.
    #[must_use]
    pub fn with_backup(mut self, backup: BackupConfig) -> Self {
        self.backup = backup;
        self
    }

    /// Sets the account credentials.
    #[must_use]
    pub fn with_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.account = AccountConfig {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
        };
        self
    }

    /// Derives the backup key for the configured account.
    ///
    /// Returns `None` when either credential is missing, which disables backup.
    #[must_use]
    pub fn backup_key(&self) -> Option<String> {
        let username = self.account.username.as_deref()?;
        let password = self.account.password.as_ref()?;

        let mut hasher = Sha256::new();
        hasher.update(username.as_bytes());
        hasher.update(b":");
        hasher.update(password.expose_secret().as_bytes());
        Some(format!("{BACKUP_KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    /// Returns true if a backup backend and account are configured.
    #[must_use]
    pub fn backup_enabled(&self) -> bool {
        self.backup.backend != BackupBackend::None && self.backup_key().is_some()
    }
}

/// Returns `~/FIND.txt`, or `FIND.txt` when the home directory is unknown.
fn default_note_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("FIND.txt"),
        |dirs| dirs.home_dir().join("FIND.txt"),
    )
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
