use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use robot_link::config::{self, HeadConfig};

/// Head node: consume Body telemetry, enforce fall/lift failsafes
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Serial device connected to the Body
    #[arg(long)]
    port: Option<String>,
    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let mut config: HeadConfig = match config::load(opts.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = opts.port {
        config.link.port = port;
    }
    if let Some(baud) = opts.baud {
        config.link.baud_rate = baud;
    }

    if let Err(e) = robot_link::runtime::run_head(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
