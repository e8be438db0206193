//! Business logic services.
//!
//! Services orchestrate the note file and the backup backends and provide the
//! high-level operations used by the CLI.

mod background;
pub mod backend_factory;
mod context;
mod note_store;
pub mod reminder;
mod sync;

pub use background::BackgroundSync;
pub use backend_factory::build_backup;
pub use context::NoteContext;
pub use note_store::{CONFIRM_TOKEN, DELETE_PREVIEW, DELETE_PROMPT, NO_RESULT, NoteStore};
pub use reminder::{Notifier, ReminderService, TerminalNotifier};
pub use sync::{SyncService, reconcile};
