//! Shutdown coordination between `run` and `terminate`.

use tokio_util::sync::{CancellationToken, DropGuard};

/// Coordinator for graceful shutdown.
///
/// Three one-way signals, each a cancellation token so waiters that arrive
/// late still observe it:
/// - `stop`: stop accepting and drain
/// - `force`: abort connections still open after the deadline
/// - `stopped`: the serving loop has returned
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    stop: CancellationToken,
    force: CancellationToken,
    stopped: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop. Returns `true` only for the first request.
    pub fn request_stop(&self) -> bool {
        let first = !self.stop.is_cancelled();
        self.stop.cancel();
        first
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolve once a stop was requested.
    pub async fn stop_requested(&self) {
        self.stop.cancelled().await
    }

    /// Token handed to connection tasks so they drain on stop.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Give up on draining.
    pub fn force(&self) {
        self.force.cancel();
    }

    pub async fn forced(&self) {
        self.force.cancelled().await
    }

    /// Marks serving as finished when dropped, however the loop exits.
    pub fn serving_guard(&self) -> DropGuard {
        self.stopped.clone().drop_guard()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Resolve once the serving loop has returned.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await
    }
}
