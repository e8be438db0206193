//! To-do reminders.
//!
//! A note whose key contains `todo` and whose value contains
//! `remind@HH:MM` or `remind@YYYY-MM-DD HH:MM` (local time) is due once the
//! current time passes the given minute. Due notes are notified, then
//! rewritten with `reminded@` so they fire only once.

use crate::io::Terminal;
use crate::models::Note;
use crate::services::NoteStore;
use crate::{Error, Result};
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Marker of a pending reminder.
pub const REMIND_MARKER: &str = "remind@";
/// Marker of a reminder that has fired.
pub const REMINDED_MARKER: &str = "reminded@";
/// Keyword selecting to-do notes.
pub const TODO_KEYWORD: &str = "todo";

/// Delivers a due reminder.
pub trait Notifier: Send + Sync {
    /// Notifies the user about the note `key` with text `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    fn notify(&self, key: &str, value: &str) -> Result<()>;
}

/// Notifier that prints to the terminal.
pub struct TerminalNotifier {
    terminal: Arc<dyn Terminal>,
}

impl TerminalNotifier {
    /// Creates a notifier writing to `terminal`.
    #[must_use]
    pub fn new(terminal: Arc<dyn Terminal>) -> Self {
        Self { terminal }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, key: &str, value: &str) -> Result<()> {
        self.terminal.emit(&format!("[reminder] {key}: {value}"));
        Ok(())
    }
}

/// Parses the text after [`REMIND_MARKER`].
///
/// `HH:MM` means today at that minute; `YYYY-MM-DD HH:MM` is absolute.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when neither format matches.
pub fn parse_remind_time(text: &str, today: NaiveDateTime) -> Result<NaiveDateTime> {
    let text = text.trim();
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M") {
        return Ok(today.date().and_time(time));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .map_err(|e| Error::InvalidInput(format!("remind time '{text}': {e}")))
}

/// Periodic scanner over to-do notes.
pub struct ReminderService {
    store: NoteStore,
    notifier: Arc<dyn Notifier>,
    scan_lock: Mutex<()>,
}

impl ReminderService {
    /// Creates a reminder service.
    #[must_use]
    pub fn new(store: NoteStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            scan_lock: Mutex::new(()),
        }
    }

    /// Scans against the current local time.
    ///
    /// # Errors
    ///
    /// See [`ReminderService::scan_at`].
    pub fn scan(&self) -> Result<usize> {
        self.scan_at(Local::now().naive_local())
    }

    /// Notifies every to-do note due before `now` and marks it reminded.
    ///
    /// Scans never overlap. Notes with an unparseable time, or whose
    /// notification fails, are logged and skipped. Returns the number of
    /// notes reminded.
    ///
    /// # Errors
    ///
    /// Returns an error if the note file cannot be read.
    #[instrument(skip(self), fields(operation = "reminder.scan"))]
    pub fn scan_at(&self, now: NaiveDateTime) -> Result<usize> {
        let _guard = self
            .scan_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut reminded = 0;
        for note in self.store.find(TODO_KEYWORD, true, false, false)? {
            let value = note.value();
            let Some((_, rest)) = value.split_once(REMIND_MARKER) else {
                continue;
            };
            let due = match parse_remind_time(rest, now) {
                Ok(due) => due,
                Err(e) => {
                    tracing::warn!(key = note.key(), error = %e, "Skipping reminder");
                    continue;
                },
            };
            if now <= due {
                continue;
            }

            if let Err(e) = self.notifier.notify(note.key(), value) {
                tracing::warn!(key = note.key(), error = %e, "Reminder notification failed");
                continue;
            }

            let updated = Note::from(note.as_str().replace(REMIND_MARKER, REMINDED_MARKER));
            match self.store.modify(&updated) {
                Ok(()) => reminded += 1,
                Err(e) => tracing::warn!(key = note.key(), error = %e, "Marking reminder failed"),
            }
        }

        metrics::counter!("note_reminders_total").increment(reminded as u64);
        tracing::debug!(reminded, "Reminder scan finished");
        Ok(reminded)
    }

    /// Runs [`ReminderService::scan`] every `interval` on the blocking pool.
    ///
    /// The first scan happens one interval after the call. Must be called
    /// inside a tokio runtime.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = interval.max(Duration::from_secs(1));
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let service = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || service.scan()).await {
                    Ok(Ok(_)) => {},
                    Ok(Err(e)) => tracing::warn!(error = %e, "Reminder scan failed"),
                    Err(e) => tracing::warn!(error = %e, "Reminder scan task panicked"),
                }
            }
        })
    }
}
