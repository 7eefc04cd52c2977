//! HTTP worker subsystem.
//!
//! # Data Flow
//! ```text
//! HttpWorker::new(logger, options)
//!     → options.rs (Settings defaults, options applied in order)
//!     → liveness route ensured on the final router
//!     → server.rs (router finalized and bound to the address)
//!
//! run()       → server.rs accept loop → net::connection per connection
//! terminate() → stop token → drain → force token after the deadline
//! alive()     → health::probe against the bound address
//! ```

pub mod options;
pub mod server;
pub mod worker;

pub use options::{
    with_address, with_router, with_shutdown_deadline, with_shutdown_timeout, Settings,
    WorkerOption, DEFAULT_ADDRESS,
};
pub use server::Server;
pub use worker::HttpWorker;
