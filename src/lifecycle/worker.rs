//! Supervisor-facing lifecycle contract.
//!
//! Any component a supervisor manages (HTTP servers, consumers, background
//! jobs) implements [`Worker`]; components that can report their own health
//! also implement [`Aliver`].

use async_trait::async_trait;

use crate::error::BoxError;
use crate::observability::Logger;

/// Uniform lifecycle of a managed component.
///
/// The supervisor calls `init` once, drives `run` on a dedicated task, and
/// calls `terminate` from a different task when the process is stopping.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Prepare the worker, binding it to the supervisor's logger.
    fn init(&mut self, logger: Logger) -> Result<(), BoxError>;

    /// Serve until terminated. Blocks for the worker's whole lifetime.
    async fn run(&self) -> Result<(), BoxError>;

    /// Stop the worker, letting in-flight work finish within its deadline.
    async fn terminate(&self) -> Result<(), BoxError>;
}

/// Liveness reporting.
#[async_trait]
pub trait Aliver: Send + Sync {
    /// `Ok` when the component is alive.
    async fn alive(&self) -> Result<(), BoxError>;
}
