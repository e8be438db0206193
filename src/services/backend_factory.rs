//! Backup backend construction from configuration.
//!
//! ```text
//! build_backup(config)
//!   ├── backend = none, or no account   → None
//!   ├── backend = redis                 → RedisBackup (feature `redis`)
//!   └── backend = filesystem            → FilesystemBackup
//! ```

use crate::config::{BackupBackend, NoteConfig};
use crate::storage::{BackupClient, FilesystemBackup, RedisBackup};
use crate::{Error, Result};
use std::sync::Arc;

/// Builds the configured backup client.
///
/// Returns `Ok(None)` when backup is disabled, i.e. no backend is selected or
/// the account is incomplete.
///
/// # Errors
///
/// Returns [`Error::Config`] if the selected backend lacks its location,
/// [`Error::FeatureNotEnabled`] if it is compiled out, or the backend's own
/// error if it cannot be opened.
pub fn build_backup(config: &NoteConfig) -> Result<Option<Arc<dyn BackupClient>>> {
    if !config.backup_enabled() {
        tracing::debug!(
            backend = ?config.backup.backend,
            "No backup backend or incomplete account, backup disabled"
        );
        return Ok(None);
    }
    let Some(key) = config.backup_key() else {
        return Ok(None);
    };

    let client: Arc<dyn BackupClient> = match config.backup.backend {
        BackupBackend::Redis => {
            let url = config.backup.url.as_deref().ok_or_else(|| Error::Config {
                cause: "backup.url is required for the redis backend".to_string(),
            })?;
            Arc::new(RedisBackup::new(url, key)?)
        },
        BackupBackend::Filesystem => {
            let path = config.backup.path.as_deref().ok_or_else(|| Error::Config {
                cause: "backup.path is required for the filesystem backend".to_string(),
            })?;
            Arc::new(FilesystemBackup::new(path, &key)?)
        },
        BackupBackend::None => return Ok(None),
    };

    tracing::info!(backend = client.name(), "Backup enabled");
    Ok(Some(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupConfig;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_without_backend() {
        let config = NoteConfig::default().with_account("me", "pw");
        assert!(build_backup(&config).unwrap().is_none());
    }

    #[test]
    fn test_disabled_without_account() {
        let dir = TempDir::new().unwrap();
        let config = NoteConfig::default().with_backup(BackupConfig {
            backend: BackupBackend::Filesystem,
            url: None,
            path: Some(dir.path().to_path_buf()),
        });
        assert!(build_backup(&config).unwrap().is_none());
    }

    #[test]
    fn test_filesystem_backend() {
        let dir = TempDir::new().unwrap();
        let config = NoteConfig::default()
            .with_account("me", "pw")
            .with_backup(BackupConfig {
                backend: BackupBackend::Filesystem,
                url: None,
                path: Some(dir.path().to_path_buf()),
            });

        let client = build_backup(&config).unwrap().unwrap();
        assert_eq!(client.name(), "filesystem");
        assert_eq!(client.size().unwrap(), 0);
    }

    #[test]
    fn test_missing_location_is_config_error() {
        let config = NoteConfig::default()
            .with_account("me", "pw")
            .with_backup(BackupConfig {
                backend: BackupBackend::Filesystem,
                url: None,
                path: None,
            });
        assert!(matches!(build_backup(&config), Err(Error::Config { .. })));
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn test_redis_without_feature() {
        let config = NoteConfig::default()
            .with_account("me", "pw")
            .with_backup(BackupConfig {
                backend: BackupBackend::Redis,
                url: Some("redis://127.0.0.1:6379".to_string()),
                path: None,
            });
        assert!(matches!(
            build_backup(&config),
            Err(Error::FeatureNotEnabled(_))
        ));
    }
}
