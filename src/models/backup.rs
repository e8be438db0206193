//! Backup entries and their JSON payload encoding.

use super::Note;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One snapshot of the whole note file held by a backup store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Modification time of the note file when the snapshot was taken
    /// (Unix epoch seconds).
    pub score: f64,
    /// JSON array of the note lines.
    pub payload: String,
}

impl BackupEntry {
    /// Builds an entry from note lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the payload cannot be encoded.
    pub fn from_notes(score: f64, notes: &[Note]) -> Result<Self> {
        Ok(Self {
            score,
            payload: encode_payload(notes)?,
        })
    }

    /// Decodes the payload into note lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the payload is not a JSON array of strings.
    pub fn notes(&self) -> Result<Vec<Note>> {
        decode_payload(&self.payload)
    }
}

/// Encodes note lines as a JSON array of strings.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn encode_payload(notes: &[Note]) -> Result<String> {
    serde_json::to_string(notes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decodes a JSON array of strings into note lines.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the payload is malformed.
pub fn decode_payload(payload: &str) -> Result<Vec<Note>> {
    serde_json::from_str(payload).map_err(|e| Error::Serialization(e.to_string()))
}
