//! Sync decisions and the events published when a sync run finishes.

use super::Note;
use crate::current_timestamp;

/// Decision taken by the reconcile procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Overwrite the local file with the latest backup payload.
    Pull(Vec<Note>),
    /// Append a new backup entry containing the local content.
    Push(Vec<Note>),
    /// Local and remote already agree, or there is nothing to move.
    NoOp,
}

impl SyncAction {
    /// Returns the action name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pull(_) => "pull",
            Self::Push(_) => "push",
            Self::NoOp => "noop",
        }
    }
}

/// Completion signal of a background sync run.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    /// Monotonic sequence number of the dispatch that produced the event.
    pub sequence: u64,
    /// The action taken, or the error message when the run failed.
    pub outcome: Result<SyncAction, String>,
    /// Timestamp (Unix epoch seconds).
    pub timestamp: f64,
}

impl SyncEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(sequence: u64, outcome: Result<SyncAction, String>) -> Self {
        Self {
            sequence,
            outcome,
            timestamp: current_timestamp(),
        }
    }

    /// Returns true when the run failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_labels() {
        assert_eq!(SyncAction::Pull(vec![]).as_str(), "pull");
        assert_eq!(SyncAction::Push(vec![]).as_str(), "push");
        assert_eq!(SyncAction::NoOp.as_str(), "noop");
    }

    #[test]
    fn test_event_error_flag() {
        assert!(SyncEvent::new(1, Err("boom".to_string())).is_error());
        assert!(!SyncEvent::new(2, Ok(SyncAction::NoOp)).is_error());
    }
}
