//! In-memory backup backend.

use crate::models::BackupEntry;
use crate::storage::traits::BackupClient;
use crate::{Error, Result};
use std::sync::Mutex;

/// Backup store kept in process memory.
///
/// Useful for tests and for embedding the note store without a remote.
#[derive(Debug, Default)]
pub struct MemoryBackup {
    entries: Mutex<Vec<BackupEntry>>,
}

impl MemoryBackup {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: Vec<BackupEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Returns a copy of every entry in insertion order.
    pub fn entries(&self) -> Result<Vec<BackupEntry>> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|e| Error::backup("memory_lock", e))
    }
}

impl BackupClient for MemoryBackup {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn size(&self) -> Result<usize> {
        self.entries
            .lock()
            .map(|entries| entries.len())
            .map_err(|e| Error::backup("memory_lock", e))
    }

    fn latest(&self) -> Result<Option<BackupEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::backup("memory_lock", e))?;
        Ok(entries
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .cloned())
    }

    fn add(&self, entry: &BackupEntry) -> Result<()> {
        self.entries
            .lock()
            .map(|mut entries| entries.push(entry.clone()))
            .map_err(|e| Error::backup("memory_lock", e))
    }
}
