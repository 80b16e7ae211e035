//! Client for the PM2.5 prediction service
//!
//! One call predicts every district for a target time. Responses use the
//! `{success, data | error}` envelope and are interpreted by
//! [`shared::interpret_response`] so the browser and the server agree on
//! what counts as a failure.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{interpret_response, ApiFailure, PredictionRequest, PredictionResult};

use crate::config::PredictionConfig;
use crate::error::{AppError, AppResult};

/// Prediction API client
#[derive(Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Reachability of the prediction service as seen from this server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub districts_loaded: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: Option<String>,
    version: Option<String>,
    districts_loaded: Option<u64>,
}

impl PredictionClient {
    /// Create a client from configuration
    pub fn new(config: &PredictionConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Predict PM2.5 for every district at the requested time
    pub async fn predict_all(&self, request: &PredictionRequest) -> Result<PredictionResult, ApiFailure> {
        let url = format!("{}/api/v2/predict/all", self.base_url);
        let body = request.clone().with_api_key(self.api_key.clone());

        tracing::debug!(
            "Requesting prediction for {:04}-{:02}-{:02} {:02}:{:02}",
            body.year,
            body.month,
            body.day,
            body.hour,
            body.minute
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Prediction API request failed: {}", e);
                ApiFailure::Unexpected(format!("request failed: {}", e))
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            tracing::error!("Failed to read prediction response: {}", e);
            ApiFailure::Unexpected(format!("unreadable body: {}", e))
        })?;

        let outcome = interpret_response::<PredictionResult>(status, &text);
        match &outcome {
            Ok(result) => tracing::info!(
                "Prediction received: {} districts, {} failed",
                result.districts.len(),
                result.errors.len()
            ),
            Err(failure) => tracing::warn!("Prediction API failure (status {}): {:?}", status, failure),
        }
        outcome
    }

    /// Probe the prediction service's health endpoint; never fails
    pub async fn health(&self) -> UpstreamHealth {
        let url = format!("{}/health", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!("Prediction service health returned {}", response.status());
                return UpstreamHealth::unreachable();
            }
            Err(e) => {
                tracing::warn!("Prediction service unreachable: {}", e);
                return UpstreamHealth::unreachable();
            }
        };

        match response.json::<HealthResponse>().await {
            Ok(health) => UpstreamHealth {
                reachable: true,
                status: health.status,
                version: health.version,
                districts_loaded: health.districts_loaded,
            },
            Err(e) => {
                tracing::warn!("Unparseable health response: {}", e);
                UpstreamHealth {
                    reachable: true,
                    status: None,
                    version: None,
                    districts_loaded: None,
                }
            }
        }
    }
}

impl UpstreamHealth {
    fn unreachable() -> Self {
        Self {
            reachable: false,
            status: None,
            version: None,
            districts_loaded: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::GENERIC_FAILURE_MESSAGE;

    const SUCCESS_BODY: &str = r#"{
        "success": true,
        "data": {
            "prediction_info": {
                "target_time": "2024-01-15 09:00",
                "prediction_for": "2024-01-15 10:00",
                "explanation": "Dự đoán PM2.5 lúc 10:00"
            },
            "districts": [
                {"id": 1, "name": "Ba Đình", "name_en": "Ba Dinh", "lat": 21.0358, "lon": 105.8194, "pm25_prediction": 48.3},
                {"id": 2, "name": "Hoàn Kiếm", "name_en": "Hoan Kiem", "lat": 21.0285, "lon": 105.8542, "pm25_prediction": 11.2}
            ],
            "statistics": {
                "city_average": 29.75,
                "city_max": 48.3,
                "city_min": 11.2,
                "city_median": 29.75,
                "total_districts": 2,
                "successful_predictions": 2,
                "success_rate_percent": 100.0,
                "who_standard_15": {"above": 1, "below": 1}
            }
        },
        "timestamp": "2024-01-15T10:00:00+07:00"
    }"#;

    fn request() -> PredictionRequest {
        PredictionRequest {
            year: 2024,
            month: 1,
            day: 15,
            hour: 9,
            minute: 0,
            api_key: None,
        }
    }

    #[tokio::test]
    async fn test_predict_all_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/predict/all")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "year": 2024, "month": 1, "day": 15, "hour": 9, "minute": 0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let client = PredictionClient::with_base_url(server.url());
        let result = tokio_test::assert_ok!(client.predict_all(&request()).await);

        mock.assert_async().await;
        assert_eq!(result.districts.len(), 2);
        assert_eq!(result.statistics.city_average, Some(29.75));
    }

    #[tokio::test]
    async fn test_predict_all_forwards_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/predict/all")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"api_key": "secret"})))
            .with_status(200)
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let config = PredictionConfig {
            base_url: server.url(),
            timeout_seconds: 5,
            api_key: Some("secret".to_string()),
        };
        let client = PredictionClient::new(&config).unwrap();
        assert!(client.predict_all(&request()).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_error_envelope_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/predict/all")
            .with_status(400)
            .with_body(r#"{"success": false, "error": {"code": "TIME_TOO_RECENT", "message": "Dữ liệu chưa sẵn sàng"}}"#)
            .create_async()
            .await;

        let client = PredictionClient::with_base_url(server.url());
        let failure = tokio_test::assert_err!(client.predict_all(&request()).await);
        assert_eq!(failure.code(), "TIME_TOO_RECENT");
        assert_eq!(failure.user_message(), "Dữ liệu chưa sẵn sàng");
    }

    #[tokio::test]
    async fn test_non_json_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/predict/all")
            .with_status(500)
            .with_body("<html>Internal Server Error</html>")
            .create_async()
            .await;

        let client = PredictionClient::with_base_url(server.url());
        let failure = client.predict_all(&request()).await.unwrap_err();
        assert_eq!(failure, ApiFailure::Status(500));
        assert_eq!(failure.user_message(), "API Error: 500");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_unexpected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/predict/all")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = PredictionClient::with_base_url(server.url());
        let failure = client.predict_all(&request()).await.unwrap_err();
        assert!(matches!(failure, ApiFailure::Unexpected(_)));
        assert_eq!(failure.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unexpected() {
        let client = PredictionClient::with_base_url("http://127.0.0.1:9");
        let failure = client.predict_all(&request()).await.unwrap_err();
        assert!(matches!(failure, ApiFailure::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "version": "2.0", "districts_loaded": 30}"#)
            .create_async()
            .await;

        let client = PredictionClient::with_base_url(format!("{}/", server.url()));
        let health = client.health().await;
        assert!(health.reachable);
        assert_eq!(health.status.as_deref(), Some("healthy"));
        assert_eq!(health.districts_loaded, Some(30));

        let down = PredictionClient::with_base_url("http://127.0.0.1:9").health().await;
        assert!(!down.reachable);
    }
}
