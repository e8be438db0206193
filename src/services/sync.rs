//! Note file synchronization service.
//!
//! Reconciles the local note file against a [`BackupClient`] by comparing the
//! file's modification time with the score of the latest backup entry. Content
//! is never merged: a pull replaces the whole file, a push appends a snapshot
//! of the whole file.
//!
//! Recency is decided by wall-clock time only. Edits made on two machines
//! between syncs resolve to whichever file was modified last; the other
//! machine's edits are dropped.

use crate::Result;
use crate::models::{BackupEntry, Note, SyncAction};
use crate::storage::{BackupClient, NoteFile};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Decides between pull, push and no-op.
///
/// `remote_latest` is only called when the remote holds entries, and at most
/// once.
///
/// | Local file | Remote size | Latest score vs. mtime | Action |
/// |------------|-------------|------------------------|--------|
/// | new | > 0 | - | Pull |
/// | new | 0 | - | NoOp |
/// | existing | 0 | - | Push (NoOp if local is empty) |
/// | existing | > 0 | greater | Pull |
/// | existing | > 0 | less | Push (NoOp if local is empty) |
/// | existing | > 0 | equal | NoOp |
///
/// # Errors
///
/// Returns an error if `remote_latest` fails or the latest payload cannot be
/// decoded.
pub fn reconcile<F>(
    is_new_local_file: bool,
    local_mod_time: f64,
    local_content: &[Note],
    remote_size: usize,
    remote_latest: F,
) -> Result<SyncAction>
where
    F: FnOnce() -> Result<Option<BackupEntry>>,
{
    let latest = if remote_size == 0 {
        None
    } else {
        remote_latest()?
    };

    let Some(latest) = latest else {
        if is_new_local_file {
            return Ok(SyncAction::NoOp);
        }
        return Ok(push_unless_empty(local_content));
    };

    if is_new_local_file {
        return Ok(SyncAction::Pull(latest.notes()?));
    }

    match latest.score.partial_cmp(&local_mod_time) {
        Some(Ordering::Greater) => Ok(SyncAction::Pull(latest.notes()?)),
        Some(Ordering::Less) => Ok(push_unless_empty(local_content)),
        Some(Ordering::Equal) | None => Ok(SyncAction::NoOp),
    }
}

fn push_unless_empty(local_content: &[Note]) -> SyncAction {
    if local_content.is_empty() {
        SyncAction::NoOp
    } else {
        SyncAction::Push(local_content.to_vec())
    }
}

/// Service that runs reconcile against a backup and applies the result.
pub struct SyncService {
    backup: Arc<dyn BackupClient>,
}

impl SyncService {
    /// Creates a sync service over `backup`.
    #[must_use]
    pub fn new(backup: Arc<dyn BackupClient>) -> Self {
        Self { backup }
    }

    /// Reconciles `file` with the backup and executes the chosen action.
    ///
    /// A pull overwrites the file directly (never through the note store) so
    /// it does not schedule another sync, and stamps the file with the pulled
    /// entry's score. A pull of an empty payload leaves the file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or the backup cannot be accessed, or the
    /// latest payload is malformed. The local file is not modified on error.
    #[instrument(
        skip(self, file),
        fields(operation = "sync.run", backend = self.backup.name(), path = %file.path().display())
    )]
    pub fn synchronize(&self, file: &NoteFile, is_new_local_file: bool) -> Result<SyncAction> {
        let start = Instant::now();
        let result: Result<SyncAction> = (|| {
            let local_mod_time = file.modified_at()?;
            let local_content = file.read_notes()?;
            let remote_size = self.backup.size()?;

            let mut latest_score = None;
            let action = reconcile(
                is_new_local_file,
                local_mod_time,
                &local_content,
                remote_size,
                || {
                    let latest = self.backup.latest()?;
                    latest_score = latest.as_ref().map(|entry| entry.score);
                    Ok(latest)
                },
            )?;

            match &action {
                SyncAction::Pull(notes) => {
                    if notes.is_empty() {
                        tracing::debug!("Latest backup is empty, keeping local file");
                    } else {
                        let score = latest_score.unwrap_or(local_mod_time);
                        file.overwrite(notes, score)?;
                        tracing::info!(notes = notes.len(), score, "Pulled backup");
                    }
                },
                SyncAction::Push(notes) => {
                    let entry = BackupEntry::from_notes(local_mod_time, notes)?;
                    self.backup.add(&entry)?;
                    tracing::info!(notes = notes.len(), score = local_mod_time, "Pushed backup");
                },
                SyncAction::NoOp => {
                    tracing::debug!(remote_size, local_mod_time, "Backup already in sync");
                },
            }

            Ok(action)
        })();

        let (action, status) = match &result {
            Ok(action) => (action.as_str(), "success"),
            Err(_) => ("none", "error"),
        };
        metrics::counter!("note_sync_total", "action" => action, "status" => status).increment(1);
        metrics::histogram!("note_sync_duration_ms", "backend" => self.backup.name())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::storage::{MemoryBackup, WriteMode};
    use tempfile::TempDir;

    fn notes(lines: &[&str]) -> Vec<Note> {
        lines.iter().map(|l| Note::from(*l)).collect()
    }

    fn entry(score: f64, lines: &[&str]) -> BackupEntry {
        BackupEntry::from_notes(score, &notes(lines)).unwrap()
    }

    #[test]
    fn test_reconcile_does_not_fetch_latest_from_empty_remote() {
        let action = reconcile(false, 10.0, &notes(&["a:1"]), 0, || {
            Err(Error::backup("latest", "must not be called"))
        })
        .unwrap();
        assert_eq!(action, SyncAction::Push(notes(&["a:1"])));
    }

    #[test]
    fn test_reconcile_new_file_with_empty_remote_is_noop() {
        let action = reconcile(true, 10.0, &[], 0, || Ok(None)).unwrap();
        assert_eq!(action, SyncAction::NoOp);
    }

    #[test]
    fn test_reconcile_existing_empty_file_with_empty_remote_is_noop() {
        let action = reconcile(false, 10.0, &[], 0, || Ok(None)).unwrap();
        assert_eq!(action, SyncAction::NoOp);
    }

    #[test]
    fn test_reconcile_newer_empty_local_does_not_push() {
        let action = reconcile(false, 10.0, &[], 1, || Ok(Some(entry(5.0, &["a:1"])))).unwrap();
        assert_eq!(action, SyncAction::NoOp);
    }

    #[test]
    fn test_reconcile_malformed_payload_is_error() {
        let bad = BackupEntry {
            score: 20.0,
            payload: "not json".to_string(),
        };
        let result = reconcile(false, 10.0, &[], 1, || Ok(Some(bad)));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_reconcile_missing_latest_falls_back_to_push() {
        let action = reconcile(false, 10.0, &notes(&["a:1"]), 3, || Ok(None)).unwrap();
        assert_eq!(action, SyncAction::Push(notes(&["a:1"])));
    }

    #[test]
    fn test_synchronize_pull_stamps_file_with_score() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();

        let backup = Arc::new(MemoryBackup::with_entries(vec![entry(
            4_000_000_000.5,
            &["remote:1"],
        )]));
        let service = SyncService::new(backup);

        let action = service.synchronize(&file, false).unwrap();
        assert_eq!(action, SyncAction::Pull(notes(&["remote:1"])));
        assert_eq!(file.read_notes().unwrap(), notes(&["remote:1"]));

        // Second run sees equal timestamps.
        assert_eq!(service.synchronize(&file, false).unwrap(), SyncAction::NoOp);
    }

    #[test]
    fn test_synchronize_malformed_payload_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();
        file.write_notes(&notes(&["local:1"]), WriteMode::Append)
            .unwrap();

        let backup = Arc::new(MemoryBackup::with_entries(vec![BackupEntry {
            score: 4_000_000_000.0,
            payload: "{oops".to_string(),
        }]));
        let service = SyncService::new(backup);

        assert!(service.synchronize(&file, false).is_err());
        assert_eq!(file.read_notes().unwrap(), notes(&["local:1"]));
    }

    #[test]
    fn test_synchronize_empty_pull_keeps_local_file() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        assert!(file.ensure_exists().unwrap());

        let backup = Arc::new(MemoryBackup::with_entries(vec![entry(1.0, &[])]));
        let service = SyncService::new(backup);

        assert_eq!(service.synchronize(&file, true).unwrap(), SyncAction::Pull(vec![]));
        assert!(file.read_notes().unwrap().is_empty());
    }
}
