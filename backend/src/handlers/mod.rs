//! HTTP handlers for the PM2.5 dashboard API

pub mod dashboard;
pub mod health;

use axum::Json;
use chrono::Utc;
use shared::ApiEnvelope;

pub use dashboard::*;
pub use health::*;

/// Wrap a payload in the `{success: true, data}` envelope
pub(crate) fn envelope<T>(data: T) -> Json<ApiEnvelope<T>> {
    let mut envelope = ApiEnvelope::success(data);
    envelope.timestamp = Some(Utc::now().to_rfc3339());
    Json(envelope)
}
