//! Shutdown deadline policy.
//!
//! # Design Decisions
//! - Each worker builds its own default; there is no process-wide deadline
//!   that could already be expired by the time a worker is constructed
//! - A relative bound is armed when shutdown starts, so the drain window is
//!   the full duration however long the worker has been serving
//! - Absolute deadlines and explicit cancellation are supported for callers
//!   that coordinate shutdown across several workers

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Drain window used when no deadline option is supplied.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Within(Duration),
    At(Instant),
    Unbounded,
}

/// Cancellable, time-bounded window for graceful shutdown.
///
/// Clones share cancellation: cancelling one clone expires all of them.
#[derive(Debug, Clone)]
pub struct ShutdownDeadline {
    bound: Bound,
    cancelled: CancellationToken,
}

impl ShutdownDeadline {
    /// Expire `timeout` after shutdown starts.
    pub fn within(timeout: Duration) -> Self {
        Self::with_bound(Bound::Within(timeout))
    }

    /// Expire at a fixed instant, regardless of when shutdown starts.
    pub fn at(deadline: Instant) -> Self {
        Self::with_bound(Bound::At(deadline))
    }

    /// Never expire on its own; only [`cancel`](Self::cancel) ends the wait.
    pub fn unbounded() -> Self {
        Self::with_bound(Bound::Unbounded)
    }

    fn with_bound(bound: Bound) -> Self {
        Self {
            bound,
            cancelled: CancellationToken::new(),
        }
    }

    /// Relative bound, if this deadline has one.
    pub fn timeout(&self) -> Option<Duration> {
        match self.bound {
            Bound::Within(timeout) => Some(timeout),
            _ => None,
        }
    }

    /// Absolute instant at which a shutdown starting at `started` expires.
    pub fn expires_at(&self, started: Instant) -> Option<Instant> {
        match self.bound {
            Bound::Within(timeout) => Some(started + timeout),
            Bound::At(deadline) => Some(deadline),
            Bound::Unbounded => None,
        }
    }

    /// Expire immediately, forcing any pending shutdown to close.
    pub fn cancel(&self) {
        self.cancelled.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Resolve when a shutdown that began at `started` runs out of time.
    pub async fn expired(&self, started: Instant) {
        let elapsed = async {
            match self.expires_at(started) {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = elapsed => {}
            _ = self.cancelled.cancelled() => {}
        }
    }
}

impl Default for ShutdownDeadline {
    fn default() -> Self {
        Self::within(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}
