//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → WorkerConfig (defaults for every missing field)
//!     → WorkerConfig::options() → HttpWorker::new
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - The file only feeds options; a bad address surfaces at run time

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{ObservabilityConfig, WorkerConfig};
