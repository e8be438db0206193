//! Data models for fnote.
//!
//! This module contains the core data structures shared by the note store,
//! the sync engine and the backup backends.

mod backup;
mod events;
mod note;

pub use backup::{BackupEntry, decode_payload, encode_payload};
pub use events::{SyncAction, SyncEvent};
pub use note::{Note, parse_key, parse_value};
