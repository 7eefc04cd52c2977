//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept, address normalization)
//!     → connection.rs (per-connection task, drain / force close)
//!     → Hand off to the finalized router
//! ```
//!
//! # Design Decisions
//! - Each connection tracked so shutdown can drain or abort it
//! - TLS is left to whatever terminates in front of the worker

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
