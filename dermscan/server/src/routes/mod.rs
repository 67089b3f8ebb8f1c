//! HTTP routes
//!
//! - `GET /health`: liveness check
//! - `POST /predict`: classify an uploaded or linked image

pub mod health;
pub mod predict;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Build the application router with all routes and middleware
pub fn build_router(state: SharedState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/predict", post(predict::predict))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
