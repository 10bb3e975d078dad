//! Liveness endpoint.

use axum::{Json, Router, routing::get};

use crate::{middleware::AppState, response::HealthResponse};

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
