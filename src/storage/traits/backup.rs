//! Backup client trait.

use crate::Result;
use crate::models::BackupEntry;

/// Capability over a remote store of whole-file snapshots ordered by score.
///
/// The store is append-only from the point of view of this crate: entries are
/// added by pushes and only the greatest-score entry is ever read. Trimming
/// old entries is left to whoever operates the store.
pub trait BackupClient: Send + Sync {
    /// Returns a short backend name for logs.
    fn name(&self) -> &'static str;

    /// Returns the number of entries currently held.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    fn size(&self) -> Result<usize>;

    /// Returns the entry with the greatest score, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the entry cannot be read.
    fn latest(&self) -> Result<Option<BackupEntry>>;

    /// Appends a new entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    fn add(&self, entry: &BackupEntry) -> Result<()>;
}
