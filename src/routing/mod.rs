//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Router::new()
//!     → middleware.rs (logger, recoverer)
//!     → router.rs (routes, groups, mounts)
//!     → Router::into_service() → axum::Router served by http::server
//! ```
//!
//! # Design Decisions
//! - Route matching itself is axum's; this layer only composes
//! - Routes and middleware are fixed before serving starts

pub mod middleware;
pub mod router;

pub use middleware::Middleware;
pub use router::Router;
