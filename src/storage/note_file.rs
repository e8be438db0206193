//! The local note file.
//!
//! One note per line. Blank lines are dropped on read and never written back.
//! No file handle is held between calls: every operation opens, works and
//! closes the file.

use crate::models::Note;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How [`NoteFile::write_notes`] treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Add the notes after the existing lines.
    Append,
    /// Discard existing content and write exactly the given notes.
    Truncate,
}

/// File I/O over the note file.
#[derive(Debug, Clone)]
pub struct NoteFile {
    path: PathBuf,
}

impl NoteFile {
    /// Creates a handle for the note file at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file (and its parent directories) when it is missing.
    ///
    /// Returns `true` when the file was created by this call.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io("create dir for", &self.path, &e))?;
        }

        File::create(&self.path).map_err(|e| Error::io("create", &self.path, &e))?;
        tracing::info!(path = %self.path.display(), "Created note file");
        Ok(true)
    }

    /// Reads every non-blank line.
    pub fn read_notes(&self) -> Result<Vec<Note>> {
        let file = File::open(&self.path).map_err(|e| Error::io("open", &self.path, &e))?;

        let mut notes = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::io("read", &self.path, &e))?;
            if !line.is_empty() {
                notes.push(Note::from(line));
            }
        }
        Ok(notes)
    }

    /// Writes `notes`, one per line, in the given mode.
    ///
    /// The file must already exist. Every write moves the modification time
    /// strictly forward, at least one millisecond past the previous one, so a
    /// snapshot pushed before the write is never scored the same as the file
    /// after it.
    pub fn write_notes(&self, notes: &[Note], mode: WriteMode) -> Result<()> {
        let previous = self.modified_at()?;

        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.write(true).truncate(true),
        };
        let file = options
            .open(&self.path)
            .map_err(|e| Error::io("open", &self.path, &e))?;

        write_lines(&file, notes).map_err(|e| Error::io("write", &self.path, &e))?;

        let current = self.modified_at()?;
        if current <= previous {
            if let Some(time) = timestamp_to_system_time(previous + 0.001) {
                file.set_modified(time)
                    .map_err(|e| Error::io("set mtime of", &self.path, &e))?;
            }
        }
        Ok(())
    }

    /// Replaces the whole content and stamps the file with `modified_at`.
    ///
    /// Used when pulling a backup so that the next comparison sees the file
    /// and the backup entry as equally recent.
    pub fn overwrite(&self, notes: &[Note], modified_at: f64) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::io("open", &self.path, &e))?;

        write_lines(&file, notes).map_err(|e| Error::io("write", &self.path, &e))?;

        if let Some(time) = timestamp_to_system_time(modified_at) {
            file.set_modified(time)
                .map_err(|e| Error::io("set mtime of", &self.path, &e))?;
        }
        Ok(())
    }

    /// Returns the last modification time in Unix epoch seconds, millisecond
    /// precision.
    pub fn modified_at(&self) -> Result<f64> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|e| Error::io("stat", &self.path, &e))?;
        Ok(system_time_to_timestamp(modified))
    }
}

fn write_lines<W: Write>(sink: W, notes: &[Note]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(sink);
    for note in notes {
        writeln!(writer, "{note}")?;
    }
    writer.flush()
}

/// Converts a file time to epoch seconds truncated to whole milliseconds.
#[allow(clippy::cast_precision_loss)]
fn system_time_to_timestamp(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64 / 1000.0)
        .unwrap_or(0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn timestamp_to_system_time(timestamp: f64) -> Option<SystemTime> {
    if !timestamp.is_finite() || timestamp < 0.0 {
        return None;
    }
    let millis = (timestamp * 1000.0).round() as u64;
    UNIX_EPOCH.checked_add(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notes(lines: &[&str]) -> Vec<Note> {
        lines.iter().map(|l| Note::from(*l)).collect()
    }

    #[test]
    fn test_ensure_exists_reports_creation() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("nested").join("notes.txt"));

        assert!(file.ensure_exists().unwrap());
        assert!(!file.ensure_exists().unwrap());
        assert!(file.read_notes().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_truncate() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();

        file.write_notes(&notes(&["a:1", "b:2"]), WriteMode::Append)
            .unwrap();
        file.write_notes(&notes(&["c:3"]), WriteMode::Append).unwrap();
        assert_eq!(file.read_notes().unwrap(), notes(&["a:1", "b:2", "c:3"]));

        file.write_notes(&notes(&["z:9"]), WriteMode::Truncate)
            .unwrap();
        assert_eq!(file.read_notes().unwrap(), notes(&["z:9"]));
    }

    #[test]
    fn test_write_always_advances_modification_time() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();

        let mut last = file.modified_at().unwrap();
        for i in 0..50 {
            let mode = if i % 2 == 0 {
                WriteMode::Append
            } else {
                WriteMode::Truncate
            };
            file.write_notes(&notes(&["a:1"]), mode).unwrap();
            let now = file.modified_at().unwrap();
            assert!(now > last, "write {i} left mtime at {now}, previous {last}");
            last = now;
        }
    }

    #[test]
    fn test_write_after_future_stamp_moves_past_it() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();
        file.overwrite(&notes(&["pulled:1"]), 4_000_000_000.5).unwrap();

        file.write_notes(&notes(&["local:1"]), WriteMode::Append)
            .unwrap();

        let modified = file.modified_at().unwrap();
        assert!((modified - 4_000_000_000.501).abs() < 1e-6);
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "a:1\n\n\nb:2\r\n\n").unwrap();

        let file = NoteFile::new(&path);
        assert_eq!(file.read_notes().unwrap(), notes(&["a:1", "b:2"]));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("missing.txt"));

        assert!(matches!(file.read_notes(), Err(Error::Io { .. })));
        assert!(matches!(
            file.write_notes(&notes(&["a:1"]), WriteMode::Append),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_overwrite_stamps_modification_time() {
        let dir = TempDir::new().unwrap();
        let file = NoteFile::new(dir.path().join("notes.txt"));
        file.ensure_exists().unwrap();
        file.write_notes(&notes(&["old:1"]), WriteMode::Append)
            .unwrap();

        file.overwrite(&notes(&["new:1", "new:2"]), 1_700_000_000.25)
            .unwrap();

        assert_eq!(file.read_notes().unwrap(), notes(&["new:1", "new:2"]));
        let modified = file.modified_at().unwrap();
        assert!((modified - 1_700_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn test_timestamp_conversion_is_millisecond_stable() {
        let time = timestamp_to_system_time(1_650_000_000.123).unwrap();
        assert!((system_time_to_timestamp(time) - 1_650_000_000.123).abs() < 1e-6);
        assert!(timestamp_to_system_time(-1.0).is_none());
        assert!(timestamp_to_system_time(f64::NAN).is_none());
    }
}
