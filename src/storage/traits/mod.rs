//! Storage backend traits.

mod backup;

pub use backup::BackupClient;
