//! Image relay service.
//!
//! ```text
//!     Browser                  image-relay                     Upstreams
//!   ───────────┐      ┌──────────────────────────────┐
//!  POST        │      │  request id → trace → limit  │
//!  /download ──┼─────▶│  relay::download ────────────┼─────▶ remote URL
//!  /upscale  ──┼─────▶│  relay::upscale              │
//!              │      │    spool → upstream::Upscaler┼─────▶ token page
//!              │      │                              ┼─────▶ node /v1/upload
//!              │      │                              ┼─────▶ node /v1/upscale
//!   ◀──────────┘      └──────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use image_relay::config::validation::validate_config;
use image_relay::config::{load_config, ConfigError, RelayConfig};
use image_relay::lifecycle::startup;
use image_relay::observability;

#[derive(Parser)]
#[command(name = "image-relay")]
#[command(about = "Download and upscale relay service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    observability::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        config_file = ?cli.config,
        nodes = config.upstream.nodes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
