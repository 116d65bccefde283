//! PadSOS CLI - local demo runner for the coordination engine.
//!
//! Runs one full help-request round (request, rank, acceptance race,
//! resolve) across simulated participants in a single process.

mod demo;
mod error;

use std::time::Duration;

use clap::Parser;

use demo::DemoOptions;
use error::CliError;
use padsos::logging::{init_logging, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};

#[derive(Parser)]
#[command(name = "padsos")]
#[command(about = "Run a local PadSOS coordination demo", long_about = None)]
#[command(version = padsos::VERSION)]
struct Args {
    /// Number of helpers racing to accept the request
    #[arg(long, default_value = "3")]
    helpers: usize,

    /// Beacon report interval in seconds
    #[arg(long, default_value = "30")]
    report_interval_secs: u64,

    /// Requester latitude in decimal degrees
    #[arg(long, default_value = "37.78825", allow_hyphen_values = true)]
    lat: f64,

    /// Requester longitude in decimal degrees
    #[arg(long, default_value = "-122.4324", allow_hyphen_values = true)]
    lon: f64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match init_logging(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    tracing::info!(version = padsos::VERSION, "padsos demo starting");

    let options = DemoOptions {
        helpers: args.helpers,
        report_interval: Duration::from_secs(args.report_interval_secs),
        latitude: args.lat,
        longitude: args.lon,
    };

    if let Err(e) = demo::run(options).await {
        e.exit();
    }
}
