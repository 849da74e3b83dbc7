//! Event debouncing for live reload.
//!
//! Collapses a burst of filesystem events into a single reload. Editors often
//! touch several files (or the same file several times) for one save, and a
//! reload in the middle of that would load a half-written tree.

use std::future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// A scheduled broadcast waiting for the quiet period to end.
struct PendingNotification {
    timer: Pin<Box<Sleep>>,
    /// Most recent path seen during the burst, kept for logging.
    path: PathBuf,
}

/// Single-timer debouncer.
///
/// At most one notification is pending at any time. Recording an event while
/// one is pending pushes its deadline back instead of scheduling another.
pub(crate) struct Debouncer {
    delay: Duration,
    pending: Option<PendingNotification>,
}

impl Debouncer {
    /// Create an idle debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record an event, (re)starting the quiet period.
    pub fn record(&mut self, path: PathBuf) {
        let deadline = Instant::now() + self.delay;

        match &mut self.pending {
            Some(pending) => {
                pending.timer.as_mut().reset(deadline);
                pending.path = path;
            }
            None => {
                self.pending = Some(PendingNotification {
                    timer: Box::pin(tokio::time::sleep_until(deadline)),
                    path,
                });
            }
        }
    }

    /// Whether a notification is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait until the pending notification is due and return its last path.
    ///
    /// Never resolves while idle. Cancel safe: dropping the future leaves the
    /// pending notification in place, so it can be used as a `select!` branch.
    pub async fn elapsed(&mut self) -> PathBuf {
        let Some(pending) = self.pending.as_mut() else {
            return future::pending().await;
        };

        pending.timer.as_mut().await;
        let path = std::mem::take(&mut pending.path);
        self.pending = None;
        path
    }
}
