//! Route definitions for the PM2.5 dashboard API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/validate", post(handlers::validate_selection))
        .route("/tiers", get(handlers::get_tiers))
        .merge(dashboard_routes())
}

/// Dashboard snapshot routes
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dashboard",
            get(handlers::get_dashboard).delete(handlers::clear_dashboard),
        )
        .route("/dashboard/predict", post(handlers::submit_prediction))
        .route("/dashboard/ranking", get(handlers::get_ranking))
        .route("/dashboard/districts/:id", get(handlers::get_district))
        .route("/dashboard/geojson", get(handlers::get_geojson))
}
