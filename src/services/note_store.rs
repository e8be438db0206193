//! Note store operations over the local note file.
//!
//! Every call re-reads the file; nothing is cached between calls. Mutations
//! dispatch a background `check()` once the file is written and return
//! without waiting for it.

use crate::io::Terminal;
use crate::models::{Note, SyncAction, parse_key};
use crate::services::{BackgroundSync, SyncService};
use crate::storage::{NoteFile, WriteMode};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Message emitted by `find` when nothing matched.
pub const NO_RESULT: &str = "No result.";
/// Header emitted before the delete preview.
pub const DELETE_PREVIEW: &str = "Will delete:";
/// Confirmation question asked before deleting.
pub const DELETE_PROMPT: &str = "Sure delete? [yes/no] ";
/// The only answer that confirms a delete.
pub const CONFIRM_TOKEN: &str = "yes";

/// The note store.
#[derive(Clone)]
pub struct NoteStore {
    file: NoteFile,
    sync: Option<Arc<SyncService>>,
    terminal: Arc<dyn Terminal>,
    background: BackgroundSync,
}

impl NoteStore {
    /// Creates a store over `file` with synchronization disabled.
    #[must_use]
    pub fn new(file: NoteFile, terminal: Arc<dyn Terminal>) -> Self {
        Self {
            file,
            sync: None,
            terminal,
            background: BackgroundSync::default(),
        }
    }

    /// Enables synchronization through `sync`.
    #[must_use]
    pub fn with_sync(mut self, sync: Arc<SyncService>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Returns the note file.
    #[must_use]
    pub const fn file(&self) -> &NoteFile {
        &self.file
    }

    /// Returns the terminal used for previews and confirmations.
    #[must_use]
    pub fn terminal(&self) -> &Arc<dyn Terminal> {
        &self.terminal
    }

    /// Returns the background sync dispatcher.
    #[must_use]
    pub const fn background(&self) -> &BackgroundSync {
        &self.background
    }

    /// Returns true when a backup is configured.
    #[must_use]
    pub const fn sync_enabled(&self) -> bool {
        self.sync.is_some()
    }

    /// Finds notes by key.
    ///
    /// With `accurate`, a note matches when its key equals `keyword`
    /// exactly. Otherwise `keyword` is split on whitespace and a note matches
    /// when its key contains every token, ignoring case. `include == false`
    /// inverts the match. Results keep file order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    #[instrument(skip(self), fields(operation = "note.find"))]
    pub fn find(
        &self,
        keyword: &str,
        include: bool,
        accurate: bool,
        emit: bool,
    ) -> Result<Vec<Note>> {
        let tokens: Vec<&str> = if accurate {
            Vec::new()
        } else {
            keyword.split_whitespace().collect()
        };

        let results: Vec<Note> = self
            .file
            .read_notes()?
            .into_iter()
            .filter(|note| {
                let hit = if accurate {
                    note.key() == keyword
                } else {
                    note.key_contains_all(&tokens)
                };
                hit == include
            })
            .collect();

        if emit {
            self.emit_notes(&results);
        }

        metrics::counter!("note_operations_total", "operation" => "find").increment(1);
        Ok(results)
    }

    /// Writes `notes` and schedules a background sync.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or written. No sync
    /// is scheduled in that case.
    #[instrument(skip(self, notes), fields(operation = "note.write", count = notes.len()))]
    pub fn write(&self, notes: &[Note], mode: WriteMode) -> Result<()> {
        self.file.write_notes(notes, mode)?;
        metrics::counter!("note_operations_total", "operation" => "write").increment(1);
        self.schedule_sync();
        Ok(())
    }

    /// Deletes every note matching `keyword`.
    ///
    /// With `confirm`, the matches are previewed and the delete only proceeds
    /// when the user answers exactly `yes`. Any other answer is a successful
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or rewritten.
    #[instrument(skip(self), fields(operation = "note.delete"))]
    pub fn delete(&self, keyword: &str, confirm: bool, accurate: bool) -> Result<()> {
        if confirm {
            self.terminal.emit(DELETE_PREVIEW);
            self.find(keyword, true, accurate, true)?;
            self.terminal.prompt(DELETE_PROMPT);

            let answer = match self.terminal.read_line() {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::debug!(error = %e, "No confirmation read");
                    String::new()
                },
            };
            if answer != CONFIRM_TOKEN {
                tracing::debug!("Delete declined");
                return Ok(());
            }
        }

        let survivors = self.find(keyword, false, accurate, false)?;
        self.write(&survivors, WriteMode::Truncate)
    }

    /// Replaces the note with the same key, moving it to the end of the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or written.
    #[instrument(skip(self, note), fields(operation = "note.modify", key = note.key()))]
    pub fn modify(&self, note: &Note) -> Result<()> {
        self.delete(parse_key(note.as_str()), false, true)?;
        self.write(std::slice::from_ref(note), WriteMode::Append)
    }

    /// Appends `note` unless its key already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the key is present, or
    /// [`Error::Io`] if the file cannot be read or written.
    #[instrument(skip(self, note), fields(operation = "note.add", key = note.key()))]
    pub fn add(&self, note: &Note) -> Result<()> {
        let key = note.key();
        if !self.find(key, true, true, false)?.is_empty() {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        self.write(std::slice::from_ref(note), WriteMode::Append)
    }

    /// Creates the file if needed and reconciles it with the backup once.
    ///
    /// Runs on the calling thread, after any background run in progress.
    /// Returns [`SyncAction::NoOp`] when no backup is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the sync fails.
    pub fn check(&self) -> Result<SyncAction> {
        self.background
            .run_exclusive(|| run_check(&self.file, self.sync.as_deref()))
    }

    fn emit_notes(&self, notes: &[Note]) {
        if notes.is_empty() {
            self.terminal.emit(NO_RESULT);
            return;
        }
        for note in notes {
            self.terminal.emit(&note.render());
        }
    }

    fn schedule_sync(&self) {
        let Some(sync) = self.sync.clone() else {
            return;
        };
        let file = self.file.clone();
        self.background
            .dispatch(move || run_check(&file, Some(sync.as_ref())));
    }
}

#[instrument(skip_all, fields(operation = "note.check", path = %file.path().display()))]
fn run_check(file: &NoteFile, sync: Option<&SyncService>) -> Result<SyncAction> {
    let is_new = file.ensure_exists()?;
    match sync {
        Some(sync) => sync.synchronize(file, is_new),
        None => {
            tracing::debug!("Backup disabled, skipping sync");
            Ok(SyncAction::NoOp)
        },
    }
}
