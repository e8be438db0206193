//! Filesystem backup backend.
//!
//! Every entry is its own JSON file inside the account directory,
//! `<dir>/<account>/<score_ms>-<digest>.json`. Point `dir` at a synced folder
//! (network share, cloud drive) to recover notes on another machine without a
//! Redis server.
//!
//! Adding an entry never rewrites existing files, so two machines pushing at
//! the same moment both keep their entry. The file name carries the score in
//! milliseconds and a digest of the entry; identical entries share a name and
//! collapse into one, like members of a sorted set. Each file is written to a
//! temporary sibling and renamed into place.

use crate::models::BackupEntry;
use crate::storage::traits::BackupClient;
use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum size of one entry file (64MB).
const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "json";

/// Distinguishes temporary files written by this process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-based backup backend.
pub struct FilesystemBackup {
    /// Directory holding the account's entry files.
    dir: PathBuf,
}

impl FilesystemBackup {
    /// Creates a backend storing the entries for `key` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Result<Self> {
        let dir = dir.as_ref().join(sanitize_file_stem(key));
        fs::create_dir_all(&dir).map_err(|e| Error::io("create backup dir", &dir, &e))?;
        Ok(Self { dir })
    }

    /// Returns the account directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists entry files with the score encoded in their names.
    fn list(&self) -> Result<Vec<(i64, PathBuf)>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| Error::io("list", &self.dir, &e))?;

        let mut files = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry
                .map_err(|e| Error::io("list", &self.dir, &e))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(score_ms) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(parse_score_ms)
            {
                files.push((score_ms, path));
            }
        }
        Ok(files)
    }

    fn read_entry(path: &Path) -> Result<BackupEntry> {
        let metadata = fs::metadata(path).map_err(|e| Error::io("stat", path, &e))?;
        if metadata.len() > MAX_ENTRY_SIZE {
            return Err(Error::Serialization(format!(
                "backup entry exceeds maximum size of {MAX_ENTRY_SIZE} bytes: {}",
                path.display()
            )));
        }

        let json = fs::read_to_string(path).map_err(|e| Error::io("read", path, &e))?;
        serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl BackupClient for FilesystemBackup {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn size(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    fn latest(&self) -> Result<Option<BackupEntry>> {
        let files = self.list()?;
        let Some(top) = files.iter().map(|(score_ms, _)| *score_ms).max() else {
            return Ok(None);
        };

        let mut latest: Option<BackupEntry> = None;
        for (_, path) in files.iter().filter(|(score_ms, _)| *score_ms == top) {
            let entry = Self::read_entry(path)?;
            if latest
                .as_ref()
                .is_none_or(|best| entry.score.total_cmp(&best.score).is_gt())
            {
                latest = Some(entry);
            }
        }
        Ok(latest)
    }

    fn add(&self, entry: &BackupEntry) -> Result<()> {
        let json =
            serde_json::to_string_pretty(entry).map_err(|e| Error::Serialization(e.to_string()))?;

        let name = entry_file_name(entry);
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!(
            ".{name}.{}-{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp, json).map_err(|e| Error::io("write", &tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::io("rename", &path, &e))
    }
}

/// Builds `<score_ms>-<digest>.json` for `entry`.
#[allow(clippy::cast_possible_truncation)]
fn entry_file_name(entry: &BackupEntry) -> String {
    let score_ms = (entry.score * 1000.0).round() as i64;

    let mut hasher = Sha256::new();
    hasher.update(entry.score.to_bits().to_be_bytes());
    hasher.update(entry.payload.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{score_ms}-{}.{ENTRY_EXTENSION}", &digest[..16])
}

/// Reads the millisecond score from an entry file stem.
fn parse_score_ms(stem: &str) -> Option<i64> {
    let (score_ms, digest) = stem.rsplit_once('-')?;
    if digest.is_empty() {
        return None;
    }
    score_ms.parse().ok()
}

/// Maps every character outside `[A-Za-z0-9_-]` to `_`.
fn sanitize_file_stem(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem
    }
}
