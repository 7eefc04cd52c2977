//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor
//!     → worker.rs (Worker / Aliver contract)
//!     → state.rs (Created → Initialized → Serving → Terminating → Terminated)
//!
//! Shutdown (shutdown.rs, deadline.rs):
//!     terminate() → stop token → stop accepting → drain connections
//!     deadline expired → force token → close remaining connections
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller invokes terminate()
//! ```
//!
//! # Design Decisions
//! - Shutdown has a deadline: forced close after it elapses
//! - Terminate is a single guarded transition; repeats are no-ops

pub mod deadline;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod worker;

pub use deadline::{ShutdownDeadline, DEFAULT_SHUTDOWN_TIMEOUT};
pub use shutdown::Shutdown;
pub use state::WorkerState;
pub use worker::{Aliver, Worker};
