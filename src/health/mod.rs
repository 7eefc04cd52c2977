//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness route (liveness.rs):
//!     GET /livez → 200 "OK"
//!
//! Liveness probe (probe.rs):
//!     HttpWorker::alive()
//!     → GET http://<own address>/livez (5s timeout)
//!     → Ok only on 200
//! ```

pub mod liveness;
pub mod probe;

pub use liveness::LIVENESS_PATH;
pub use probe::{probe, PROBE_TIMEOUT};
