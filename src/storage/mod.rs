//! Storage layer.
//!
//! - **Note file**: the authoritative local store, one `key:value` per line
//! - **Backup**: remote snapshots of the whole note file, ordered by score
//!   (in-memory, filesystem, Redis)

pub mod backup;
mod note_file;
pub mod traits;

pub use backup::{FilesystemBackup, MemoryBackup, RedisBackup};
pub use note_file::{NoteFile, WriteMode};
pub use traits::BackupClient;
