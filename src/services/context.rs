//! Explicit, ordered construction of the running components.
//!
//! Backup client first, then the note store, then the sync service, then the
//! one-time startup check. Each stage can be substituted through
//! [`NoteContext::from_parts`].

use crate::Result;
use crate::config::NoteConfig;
use crate::io::Terminal;
use crate::models::SyncAction;
use crate::services::backend_factory::build_backup;
use crate::services::reminder::{Notifier, ReminderService};
use crate::services::{NoteStore, SyncService};
use crate::storage::{BackupClient, NoteFile};
use std::sync::Arc;

/// Everything a command needs to run.
pub struct NoteContext {
    store: NoteStore,
}

impl NoteContext {
    /// Builds the components described by `config`.
    ///
    /// A backup that cannot be built is logged and left disabled; the note
    /// store still works locally.
    #[must_use]
    pub fn build(config: &NoteConfig, terminal: Arc<dyn Terminal>) -> Self {
        let backup = match build_backup(config) {
            Ok(backup) => backup,
            Err(e) => {
                tracing::warn!(error = %e, "Backup unavailable, continuing without sync");
                None
            },
        };
        Self::from_parts(NoteFile::new(&config.note_path), backup, terminal)
    }

    /// Builds the components and runs the startup check.
    ///
    /// A failed startup check is logged, not returned.
    #[must_use]
    pub fn open(config: &NoteConfig, terminal: Arc<dyn Terminal>) -> Self {
        let context = Self::build(config, terminal);
        match context.startup_check() {
            Ok(action) => tracing::debug!(action = action.as_str(), "Startup check finished"),
            Err(e) => tracing::warn!(error = %e, "Startup check failed"),
        }
        context
    }

    /// Assembles a context from already built parts.
    #[must_use]
    pub fn from_parts(
        file: NoteFile,
        backup: Option<Arc<dyn BackupClient>>,
        terminal: Arc<dyn Terminal>,
    ) -> Self {
        let mut store = NoteStore::new(file, terminal);
        if let Some(backup) = backup {
            store = store.with_sync(Arc::new(SyncService::new(backup)));
        }
        Self { store }
    }

    /// Ensures the note file exists and reconciles it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the sync fails.
    pub fn startup_check(&self) -> Result<SyncAction> {
        self.store.check()
    }

    /// Returns the note store.
    #[must_use]
    pub const fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Creates a reminder service over this context's store.
    #[must_use]
    pub fn reminder(&self, notifier: Arc<dyn Notifier>) -> Arc<ReminderService> {
        Arc::new(ReminderService::new(self.store.clone(), notifier))
    }
}
