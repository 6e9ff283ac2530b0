//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// SSAs currently in service
    pub records: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let dataset = state.snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "ssa-dash".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: dataset.records.len(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
