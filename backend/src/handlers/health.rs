//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::external::UpstreamHealth;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub prediction_service: UpstreamHealth,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream = state.dashboard.client().health().await;

    let status = if upstream.reachable { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        prediction_service: upstream,
    })
}
