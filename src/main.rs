//! HTTP worker process.
//!
//! Runs a single [`HttpWorker`] the way a supervisor would: `init`, `run`
//! on its own task, `terminate` on SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use http_worker::config::{load_config, WorkerConfig};
use http_worker::lifecycle::signals::shutdown_signal;
use http_worker::observability::logging;
use http_worker::{with_address, with_shutdown_timeout, HttpWorker, Logger};

#[derive(Parser)]
#[command(name = "http-worker")]
#[command(about = "HTTP server run as a supervised worker", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file.
    #[arg(short, long)]
    address: Option<String>,

    /// Graceful shutdown window in seconds, overrides the config file.
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorkerConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("http-worker v{} starting", env!("CARGO_PKG_VERSION"));

    let mut options = config.options();
    if let Some(address) = args.address {
        options.push(with_address(address));
    }
    if let Some(secs) = args.shutdown_timeout_secs {
        options.push(with_shutdown_timeout(std::time::Duration::from_secs(secs)));
    }

    let logger = Logger::new("http-worker");
    let mut worker = HttpWorker::new(logger.clone(), options);
    worker.init(logger);

    tracing::info!(
        address = %worker.address(),
        shutdown_timeout_secs = ?worker.shutdown_deadline().timeout().map(|t| t.as_secs()),
        "Configuration loaded"
    );

    let worker = Arc::new(worker);
    let mut serving = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    tokio::select! {
        // Run ended on its own: a bind or accept failure.
        joined = &mut serving => {
            joined??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    let terminated = worker.terminate().await;
    serving.await??;
    terminated?;

    tracing::info!("Shutdown complete");
    Ok(())
}
