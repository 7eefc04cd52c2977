//! Error types surfaced by the worker lifecycle.
//!
//! Every variant is logged where it happens and then handed back to the
//! caller, so a supervisor can decide whether to restart or exit.

use thiserror::Error;

use crate::lifecycle::WorkerState;

/// Boxed error used at the supervisor boundary, where workers of different
/// kinds report failures through one trait.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the HTTP worker lifecycle.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The listener could not be bound (bad address, port in use).
    #[error("failed to bind listener on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed while accepting connections.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// `run` was called while the worker was already serving.
    #[error("worker is already running")]
    AlreadyRunning,

    /// In-flight requests did not finish before the shutdown deadline; the
    /// remaining connections were closed.
    #[error("graceful shutdown did not finish before the deadline, {closed} connection(s) forcibly closed")]
    ShutdownDeadlineExceeded { closed: usize },

    /// The liveness probe did not get a `200 OK` back.
    #[error("health check failed for {url}: {source}")]
    HealthCheck {
        url: String,
        #[source]
        source: ProbeError,
    },
}

/// Underlying cause of a failed liveness probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build probe client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("server is not responding with status OK (got {0})")]
    Status(reqwest::StatusCode),

    /// The worker has no listener of its own to probe.
    #[error("worker is not serving (state {0:?})")]
    NotServing(WorkerState),
}

impl WorkerError {
    /// True when the failure came from the liveness probe.
    pub fn is_health_check(&self) -> bool {
        matches!(self, WorkerError::HealthCheck { .. })
    }
}
