//! HTTP worker library.
//!
//! An HTTP server packaged as a supervisor-managed worker: `init`, `run`,
//! `terminate` and `alive`, with a liveness route that is always present
//! and a graceful shutdown bounded by a deadline.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use http_worker::{with_address, with_shutdown_timeout, HttpWorker, Logger};
//!
//! # async fn demo() -> Result<(), http_worker::WorkerError> {
//! let mut worker = HttpWorker::new(
//!     Logger::new("svc"),
//!     [with_address(":8081"), with_shutdown_timeout(Duration::from_secs(2))],
//! );
//! worker.init(Logger::new("svc"));
//!
//! let worker = Arc::new(worker);
//! let serving = tokio::spawn({
//!     let worker = worker.clone();
//!     async move { worker.run().await }
//! });
//!
//! worker.alive().await?;
//! worker.terminate().await?;
//! let _ = serving.await;
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use error::{BoxError, ProbeError, WorkerError};
pub use http::{
    with_address, with_router, with_shutdown_deadline, with_shutdown_timeout, HttpWorker,
    WorkerOption,
};
pub use lifecycle::{Aliver, ShutdownDeadline, Worker, WorkerState};
pub use observability::Logger;
pub use routing::{Middleware, Router};
