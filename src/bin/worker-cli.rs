use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::json;

use http_worker::health::{self, probe::liveness_url};
use http_worker::net::listener::probe_authority;

#[derive(Parser)]
#[command(name = "worker-cli")]
#[command(about = "Management CLI for HTTP workers", long_about = None)]
struct Cli {
    /// Worker address, as configured (":8080", "127.0.0.1:8080").
    #[arg(short, long, default_value = ":8080")]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the worker's liveness route
    Probe,
    /// Print the URL a probe would hit
    Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let authority = probe_authority(&cli.address);

    match cli.command {
        Commands::Probe => {
            let started = Instant::now();
            let result = health::probe(&authority).await;
            let report = json!({
                "url": liveness_url(&authority),
                "alive": result.is_ok(),
                "elapsed_ms": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "error": result.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);

            if result.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Url => {
            println!("{}", liveness_url(&authority));
        }
    }

    Ok(())
}
