//! WebAssembly module for the PM2.5 district dashboard
//!
//! Provides client-side computation for:
//! - Target time validation against the browser clock
//! - PM2.5 tier classification (color and label)
//! - Interpreting prediction service responses
//! - Building card, marker and chart view models

use chrono::{DateTime, Duration, NaiveDateTime};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::tier::*;
pub use shared::validation::*;

use shared::{interpret_response, DashboardSession, DashboardView, GeoJsonCollection, PredictionForm};

/// Vietnam wall-clock offset used when the page does not pass one
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

fn log_warning(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Current wall-clock time at the given UTC offset, from the browser clock
fn browser_now(utc_offset_hours: i32) -> NaiveDateTime {
    let millis = js_sys::Date::now() as i64;
    let utc = DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .naive_utc();
    utc + Duration::hours(utc_offset_hours as i64)
}

fn parse_now(now: &str) -> Result<NaiveDateTime, JsValue> {
    NaiveDateTime::parse_from_str(now, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| JsValue::from_str(&format!("Invalid time {}: {}", now, e)))
}

/// Validate a date/hour/minute selection against the browser clock
#[wasm_bindgen]
pub fn validate_selection(
    date: &str,
    hour: &str,
    minute: &str,
    utc_offset_hours: Option<i32>,
) -> Result<String, JsValue> {
    let now = browser_now(utc_offset_hours.unwrap_or(DEFAULT_UTC_OFFSET_HOURS));
    to_json(&validate_prediction_time(date, hour, minute, now))
}

/// Validate against an explicit `YYYY-MM-DDTHH:MM:SS` wall-clock time
#[wasm_bindgen]
pub fn validate_selection_at(date: &str, hour: &str, minute: &str, now: &str) -> Result<String, JsValue> {
    let now = parse_now(now)?;
    to_json(&validate_prediction_time(date, hour, minute, now))
}

/// Tier of a PM2.5 value (`good`, `moderate`, `poor`, `bad`, `very_bad`)
#[wasm_bindgen]
pub fn classify_pm25(pm25: f64) -> String {
    serde_json::to_value(classify(pm25))
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Marker/card color for a PM2.5 value
#[wasm_bindgen]
pub fn pm25_color(pm25: f64) -> String {
    classify(pm25).color().to_string()
}

/// Vietnamese tier label for a PM2.5 value
#[wasm_bindgen]
pub fn pm25_label(pm25: f64) -> String {
    classify(pm25).label_vi().to_string()
}

/// Legend entries as JSON
#[wasm_bindgen]
pub fn tier_legend() -> Result<String, JsValue> {
    to_json(&legend())
}

/// Build the dashboard view model from a `PredictionResult` JSON
#[wasm_bindgen]
pub fn build_dashboard(result_json: &str) -> Result<String, JsValue> {
    let result: PredictionResult = serde_json::from_str(result_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid prediction JSON: {}", e)))?;
    to_json(&DashboardView::build(&result))
}

/// Build a GeoJSON feature collection from a `PredictionResult` JSON
#[wasm_bindgen]
pub fn build_geojson(result_json: &str) -> Result<String, JsValue> {
    let result: PredictionResult = serde_json::from_str(result_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid prediction JSON: {}", e)))?;
    to_json(&GeoJsonCollection::build(&result))
}

/// Dashboard state held by the page between renders.
///
/// JavaScript performs the `fetch`; this object decides whether a submission
/// may start, builds its body, and interprets the response.
#[wasm_bindgen]
pub struct Dashboard {
    session: DashboardSession,
    utc_offset_hours: i32,
}

#[wasm_bindgen]
impl Dashboard {
    #[wasm_bindgen(constructor)]
    pub fn new(utc_offset_hours: Option<i32>) -> Dashboard {
        Dashboard {
            session: DashboardSession::new(),
            utc_offset_hours: utc_offset_hours.unwrap_or(DEFAULT_UTC_OFFSET_HOURS),
        }
    }

    /// Start a submission; returns the request body JSON or throws the error JSON
    pub fn submit(&mut self, date: &str, hour: &str, minute: &str) -> Result<String, JsValue> {
        let now = browser_now(self.utc_offset_hours);
        self.submit_at_time(date, hour, minute, now)
    }

    /// Same as `submit` with an explicit `YYYY-MM-DDTHH:MM:SS` wall-clock time
    pub fn submit_at(&mut self, date: &str, hour: &str, minute: &str, now: &str) -> Result<String, JsValue> {
        let now = parse_now(now)?;
        self.submit_at_time(date, hour, minute, now)
    }

    /// Finish the submission with the HTTP status and body; returns the view JSON
    pub fn receive(&mut self, status: u16, body: &str) -> Result<String, JsValue> {
        let outcome = interpret_response::<PredictionResult>(status, body);
        match self.session.complete(outcome) {
            Ok(snapshot) => to_json(&DashboardView::build(&snapshot)),
            Err(error) => {
                log_warning(&error.to_string());
                Err(JsValue::from_str(&to_json(&error)?))
            }
        }
    }

    /// Finish the submission after `fetch` itself rejected; returns the recorded error JSON
    pub fn receive_network_error(&mut self, reason: &str) -> Result<String, JsValue> {
        let outcome = Err(ApiFailure::Unexpected(reason.to_string()));
        match self.session.complete(outcome) {
            Ok(snapshot) => to_json(&DashboardView::build(&snapshot)),
            Err(error) => {
                log_warning(&error.to_string());
                to_json(&error)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    /// Current view JSON, `undefined` before the first successful prediction
    pub fn current_view(&self) -> Result<Option<String>, JsValue> {
        self.session
            .current()
            .map(|snapshot| to_json(&DashboardView::build(&snapshot)))
            .transpose()
    }

    /// Active error JSON, `undefined` when there is none
    pub fn last_error(&self) -> Result<Option<String>, JsValue> {
        self.session.last_error().map(to_json).transpose()
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }
}

impl Dashboard {
    fn submit_at_time(
        &mut self,
        date: &str,
        hour: &str,
        minute: &str,
        now: NaiveDateTime,
    ) -> Result<String, JsValue> {
        let form = PredictionForm::new(date, hour, minute);
        match self.session.begin(&form, now) {
            Ok(request) => to_json(&request),
            Err(error) => Err(JsValue::from_str(&to_json(&error)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2024-01-15T10:00:00";

    #[test]
    fn test_classify_pm25() {
        assert_eq!(classify_pm25(12.0), "good");
        assert_eq!(classify_pm25(35.0), "moderate");
        assert_eq!(classify_pm25(55.0), "poor");
        assert_eq!(classify_pm25(150.0), "bad");
        assert_eq!(classify_pm25(150.5), "very_bad");
    }

    #[test]
    fn test_color_and_label_follow_classifier() {
        assert_eq!(pm25_color(40.0), classify(40.0).color());
        assert_eq!(pm25_label(8.0), "Tốt");
    }

    #[test]
    fn test_validate_selection_at() {
        let json = validate_selection_at("2024-01-15", "9", "35", NOW).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["valid"], false);
        assert_eq!(value["error_code"], "TIME_TOO_RECENT");

        let json = validate_selection_at("2024-01-15", "9", "30", NOW).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["valid"], true);
    }

    #[test]
    fn test_dashboard_round() {
        let mut dashboard = Dashboard::new(None);
        let body = dashboard.submit_at("2024-01-15", "9", "0", NOW).unwrap();
        let request: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            request,
            serde_json::json!({"year": 2024, "month": 1, "day": 15, "hour": 9, "minute": 0})
        );
        assert!(dashboard.is_loading());

        let response = r#"{"success": true, "data": {
            "prediction_info": {"target_time": "2024-01-15 09:00", "prediction_for": "2024-01-15 10:00", "explanation": "e"},
            "districts": [{"id": 1, "name": "Ba Đình", "name_en": "Ba Dinh", "lat": 21.03, "lon": 105.81, "pm25_prediction": 42.17}],
            "statistics": {"city_average": 42.17, "city_max": 42.17, "city_min": 42.17, "city_median": 42.17,
                           "success_rate_percent": 100.0, "who_standard_15": {"above": 1, "below": 0}}
        }}"#;
        let view = dashboard.receive(200, response).unwrap();
        let view: serde_json::Value = serde_json::from_str(&view).unwrap();
        assert_eq!(view["cards"][0]["tier"], "poor");
        assert!(!dashboard.is_loading());
        assert!(dashboard.current_view().unwrap().is_some());
    }

    #[test]
    fn test_network_error_is_recorded() {
        let mut dashboard = Dashboard::new(Some(7));
        dashboard.submit_at("2024-01-15", "9", "0", NOW).unwrap();
        let error = dashboard.receive_network_error("Failed to fetch").unwrap();
        let error: serde_json::Value = serde_json::from_str(&error).unwrap();
        assert_eq!(error["kind"], "unexpected");
        assert!(!dashboard.is_loading());
        assert!(dashboard.last_error().unwrap().is_some());
        assert!(dashboard.current_view().unwrap().is_none());
    }
}
