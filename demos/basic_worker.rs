//! Minimal HTTP worker: serves a greeting on `:8081` until Ctrl-C.
//!
//! ```bash
//! cargo run --example basic_worker
//! curl http://localhost:8081/
//! curl http://localhost:8081/livez
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use http_worker::observability::logging;
use http_worker::{with_address, with_router, with_shutdown_timeout, HttpWorker, Logger, Router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");

    let mut router = Router::new();
    router.route("/", get(|| async { "Hello, HTTP Worker!" }));

    let logger = Logger::new("demo");
    let mut worker = HttpWorker::new(
        logger.clone(),
        [
            with_router(router),
            with_address(":8081"),
            with_shutdown_timeout(Duration::from_secs(5)),
        ],
    );
    worker.init(logger);
    let worker = Arc::new(worker);

    let serving = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    tokio::signal::ctrl_c().await?;
    worker.terminate().await?;
    serving.await??;

    Ok(())
}
