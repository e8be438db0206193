//! Note lines and the `key:value` line codec.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimiter between key and value. Only the first occurrence splits.
pub const DELIMITER: char = ':';

/// Returns the substring before the first `:`, or `""` when there is none.
#[must_use]
pub fn parse_key(line: &str) -> &str {
    line.split_once(DELIMITER).map_or("", |(key, _)| key)
}

/// Returns the substring after the first `:`, or `""` when there is none.
#[must_use]
pub fn parse_value(line: &str) -> &str {
    line.split_once(DELIMITER).map_or("", |(_, value)| value)
}

/// A single `key:value` line of the note file.
///
/// Any string is a legal note. A line without `:` has an empty key and an
/// empty value, and is still stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Note(String);

impl Note {
    /// Builds a note from its key and value.
    #[must_use]
    pub fn new(key: &str, value: &str) -> Self {
        Self(format!("{key}{DELIMITER}{value}"))
    }

    /// Wraps a raw line.
    #[must_use]
    pub fn from_line(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    /// Returns the raw line.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &str {
        parse_key(&self.0)
    }

    /// Returns the value.
    #[must_use]
    pub fn value(&self) -> &str {
        parse_value(&self.0)
    }

    /// Renders the note for terminal output as `key: value`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}: {}", self.key(), self.value())
    }

    /// Returns true if the key contains every token, ignoring case.
    #[must_use]
    pub fn key_contains_all<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        let key = self.key().to_lowercase();
        tokens
            .iter()
            .all(|token| key.contains(&token.as_ref().to_lowercase()))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Note {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Note {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Note {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
