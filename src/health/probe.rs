//! Liveness probing.
//!
//! # Responsibilities
//! - Issue `GET /livez` against a worker's own address
//! - Treat anything but a `200` as unhealthy, keeping the cause
//!
//! # Design Decisions
//! - A real round trip exercises accept, dispatch and respond, which an
//!   in-memory flag cannot
//! - The client timeout is fixed and unrelated to the shutdown deadline
//! - Proxy environment variables are ignored; the probe targets loopback

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{ProbeError, WorkerError};
use crate::health::liveness::LIVENESS_PATH;

/// Client-side timeout of a liveness probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// URL probed for a worker reachable at `authority` (`host:port`).
pub fn liveness_url(authority: &str) -> String {
    format!("http://{}{}", authority, LIVENESS_PATH)
}

/// Probe the liveness route at `authority`.
pub async fn probe(authority: &str) -> Result<(), WorkerError> {
    let url = liveness_url(authority);

    let result: Result<(), ProbeError> = async {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .no_proxy()
            .user_agent("http-worker-liveness-probe")
            .build()
            .map_err(ProbeError::Client)?;

        let response = client.get(&url).send().await.map_err(ProbeError::Request)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ProbeError::Status(status)),
        }
    }
    .await;

    result.map_err(|source| WorkerError::HealthCheck { url, source })
}
