//! Liveness endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub version: &'static str,
    /// Compute backend the model runs on, e.g. "ndarray (CPU)"
    pub backend: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let response = HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        version: dermscan::VERSION,
        backend: dermscan::backend::backend_name(),
    };
    Json(response)
}
