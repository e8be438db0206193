//! Backup backend implementations.

mod filesystem;
mod memory;
mod redis;

pub use filesystem::FilesystemBackup;
pub use memory::MemoryBackup;
pub use redis::RedisBackup;
