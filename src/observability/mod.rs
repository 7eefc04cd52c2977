//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Worker lifecycle events
//!     → Logger scope (logger = "svc.http_worker")
//!     → tracing subscriber (fmt layer, EnvFilter)
//!
//! Requests
//!     → routing::Middleware::logger (TraceLayer span per request)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (address, error, counts)
//! - The logger is injected, never a process global

pub mod logging;

pub use logging::Logger;
