//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use http_worker::{HttpWorker, WorkerError};
use tokio::task::JoinHandle;

/// Client that never pools and never goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Spawn `run` on its own task.
pub fn spawn_run(worker: &Arc<HttpWorker>) -> JoinHandle<Result<(), WorkerError>> {
    let worker = worker.clone();
    tokio::spawn(async move { worker.run().await })
}

/// Poll `alive` until it succeeds or `timeout` elapses.
pub async fn wait_until_alive(worker: &HttpWorker, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match worker.alive().await {
            Ok(()) => return,
            Err(e) if tokio::time::Instant::now() >= deadline => {
                panic!("worker never became alive: {e}")
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(25)).await,
        }
    }
}
