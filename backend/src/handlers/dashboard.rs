//! HTTP handlers for the dashboard endpoints

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{
    legend, ApiEnvelope, DashboardView, DistrictCard, GeoJsonCollection, PredictionForm, RankKey,
    SortOrder, TierInfo, ValidationResult,
};
use validator::Validate;

use super::envelope;
use crate::error::{AppError, AppResult};
use crate::services::{DashboardState, RankingResponse, ValidationInput};
use crate::AppState;

/// Check a date/hour/minute selection without predicting
pub async fn validate_selection(
    State(state): State<AppState>,
    Json(input): Json<ValidationInput>,
) -> Json<ApiEnvelope<ValidationResult>> {
    envelope(state.dashboard.validate(&input))
}

/// Predict every district for the selected time and return the new view
pub async fn submit_prediction(
    State(state): State<AppState>,
    Json(form): Json<PredictionForm>,
) -> AppResult<Json<ApiEnvelope<DashboardView>>> {
    let view = state.dashboard.submit(form).await?;
    Ok(envelope(view))
}

/// Current view, last error and loading flag
pub async fn get_dashboard(State(state): State<AppState>) -> Json<ApiEnvelope<DashboardState>> {
    envelope(state.dashboard.state().await)
}

/// Discard the snapshot and error
pub async fn clear_dashboard(State(state): State<AppState>) -> Json<ApiEnvelope<bool>> {
    state.dashboard.clear().await;
    envelope(true)
}

/// Query parameters for the ranking
#[derive(Debug, Deserialize, Validate)]
pub struct RankingQuery {
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// Districts ordered by predicted PM2.5 or population
pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Json<ApiEnvelope<RankingResponse>>> {
    query
        .validate()
        .map_err(|e| AppError::InvalidQuery(e.to_string()))?;

    let sort_by = match query.sort_by.as_deref() {
        Some(key) => RankKey::from_str(key).map_err(AppError::InvalidSort)?,
        None => RankKey::default(),
    };

    let limit = query.limit.unwrap_or(state.config.dashboard.ranking_limit);
    let ranking = state.dashboard.ranking(sort_by, query.order, limit).await?;
    Ok(envelope(ranking))
}

/// One district of the current snapshot
pub async fn get_district(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiEnvelope<DistrictCard>>> {
    let card = state.dashboard.district(&id).await?;
    Ok(envelope(card))
}

/// Current snapshot as a GeoJSON feature collection
pub async fn get_geojson(State(state): State<AppState>) -> AppResult<Json<ApiEnvelope<GeoJsonCollection>>> {
    let collection = state.dashboard.geojson().await?;
    Ok(envelope(collection))
}

/// Tier legend (colors, labels, ranges)
pub async fn get_tiers() -> Json<ApiEnvelope<Vec<TierInfo>>> {
    envelope(legend())
}
