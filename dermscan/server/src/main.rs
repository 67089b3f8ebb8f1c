//! DermScan prediction server
//!
//! Loads a trained checkpoint and serves predictions over HTTP:
//!
//! ```text
//! curl -F "image=@lesion.jpg" http://localhost:8080/predict
//! curl -H "Content-Type: application/json" \
//!      -d '{"image_url": "https://example.com/lesion.jpg"}' \
//!      http://localhost:8080/predict
//! ```

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dermscan::backend::{backend_name, default_device, DefaultBackend};
use dermscan::utils::logging::{init_logging, parse_level};
use dermscan::Predictor;

use crate::routes::build_router;
use crate::state::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "dermscan-server",
    version = dermscan::VERSION,
    about = "Skin lesion prediction server"
)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Trained model checkpoint
    #[arg(short, long, env = "DERMSCAN_MODEL", default_value = "output/model.mpk")]
    model: PathBuf,

    /// Timeout in seconds for fetching images from URLs
    #[arg(long, default_value = "30")]
    fetch_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DERMSCAN_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = parse_level(&cli.log_level)
        .ok_or_else(|| anyhow::anyhow!("Unknown log level: {}", cli.log_level))?;
    if let Err(e) = init_logging(level) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    info!("DermScan prediction server (backend: {})", backend_name());

    let device = default_device();
    let started = Instant::now();
    let predictor = Predictor::<DefaultBackend>::from_file(&cli.model, device)
        .with_context(|| format!("Failed to load model {}", cli.model.display()))?;
    info!(
        "Loaded model from {} in {:.2}s",
        cli.model.display(),
        started.elapsed().as_secs_f64()
    );

    let config = ServerConfig {
        fetch_timeout_secs: cli.fetch_timeout,
        ..Default::default()
    };
    let state = Arc::new(AppState::new(predictor, config)?);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid host/port")?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
