//! Shared server state

use std::sync::Arc;
use std::time::{Duration, Instant};

use dermscan::backend::DefaultBackend;
use dermscan::Predictor;

/// Server tunables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Timeout for fetching images from URLs
    pub fetch_timeout_secs: u64,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Application state shared across request handlers
pub struct AppState {
    /// The loaded classifier
    pub predictor: Predictor<DefaultBackend>,
    /// Client for fetching images from URLs
    pub http: reqwest::Client,
    /// Server tunables
    pub config: ServerConfig,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        predictor: Predictor<DefaultBackend>,
        config: ServerConfig,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            predictor,
            http,
            config,
            started_at: Instant::now(),
        })
    }

    /// Whole seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Application state shared via `Arc`
pub type SharedState = Arc<AppState>;
