//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::options::{self, WorkerOption, DEFAULT_ADDRESS};
use crate::lifecycle::DEFAULT_SHUTDOWN_TIMEOUT;

/// Root configuration for a worker process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Bind address (e.g., ":8080" or "127.0.0.1:8080").
    pub address: String,

    /// Graceful shutdown window in seconds.
    pub shutdown_timeout_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Worker options equivalent to this configuration.
    pub fn options(&self) -> Vec<WorkerOption> {
        vec![
            options::with_address(self.address.clone()),
            options::with_shutdown_timeout(self.shutdown_timeout()),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: WorkerConfig = toml::from_str("").unwrap();
        assert_eq!(config.address, ":8080");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: WorkerConfig = toml::from_str(
            r#"
            address = "127.0.0.1:9000"

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.address, "127.0.0.1:9000");
        assert_eq!(config.shutdown_timeout_secs, 5);
        assert_eq!(config.observability.log_level, "debug");
    }
}
