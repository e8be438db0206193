//! Fire-and-forget execution of sync runs.
//!
//! Mutations return as soon as the note file is written; the follow-up sync
//! runs on a blocking worker. Runs are serialized so two reconciles never
//! interleave on the same file. Every finished run publishes a [`SyncEvent`]
//! and decrements the in-flight counter, which [`BackgroundSync::wait_idle`]
//! watches.

use crate::Result;
use crate::models::{SyncAction, SyncEvent};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};

const DEFAULT_EVENT_CAPACITY: usize = 64;

struct Inner {
    sender: broadcast::Sender<SyncEvent>,
    in_flight: AtomicUsize,
    sequence: AtomicU64,
    idle: Notify,
    run_lock: Mutex<()>,
}

/// Dispatcher for background sync runs.
#[derive(Clone)]
pub struct BackgroundSync {
    inner: Arc<Inner>,
}

impl Default for BackgroundSync {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl BackgroundSync {
    /// Creates a dispatcher whose event channel buffers `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                sender,
                in_flight: AtomicUsize::new(0),
                sequence: AtomicU64::new(0),
                idle: Notify::new(),
                run_lock: Mutex::new(()),
            }),
        }
    }

    /// Runs `job` in the background and returns its sequence number.
    ///
    /// Uses the tokio blocking pool when called inside a runtime, and a plain
    /// thread otherwise. Errors are logged and published, never returned.
    pub fn dispatch<F>(&self, job: F) -> u64
    where
        F: FnOnce() -> Result<SyncAction> + Send + 'static,
    {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("note_sync_dispatched_total").increment(1);

        let inner = Arc::clone(&self.inner);
        let task = move || run(&inner, sequence, job);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            drop(handle.spawn_blocking(task));
        } else {
            std::thread::spawn(task);
        }
        sequence
    }

    /// Runs `job` on the calling thread, never concurrently with a
    /// background run.
    pub fn run_exclusive<T>(&self, job: impl FnOnce() -> T) -> T {
        let _guard = self
            .inner
            .run_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        job()
    }

    /// Subscribes to completion events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.sender.subscribe()
    }

    /// Returns the number of dispatched runs that have not finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until no run is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Waits until no run is in flight, giving up after `timeout`.
    ///
    /// Returns `true` when the dispatcher became idle in time.
    pub async fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

fn run<F>(inner: &Inner, sequence: u64, job: F)
where
    F: FnOnce() -> Result<SyncAction>,
{
    let outcome = {
        let _guard = inner
            .run_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        job()
    };

    let outcome = match outcome {
        Ok(action) => {
            tracing::debug!(sequence, action = action.as_str(), "Background sync finished");
            Ok(action)
        },
        Err(e) => {
            tracing::warn!(sequence, error = %e, "Background sync failed");
            Err(e.to_string())
        },
    };

    // No subscribers is fine.
    let _ = inner.sender.send(SyncEvent::new(sequence, outcome));

    if inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
        inner.idle.notify_waiters();
    }
}
