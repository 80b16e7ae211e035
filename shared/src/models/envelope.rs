//! Response envelope used by the prediction service

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown for failures that carry nothing the user can act on
pub const GENERIC_FAILURE_MESSAGE: &str = "Lỗi hệ thống. Vui lòng thử lại sau";

/// `{ success, data }` on success, `{ success: false, error }` on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Structured error returned by the prediction service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            timestamp: None,
        }
    }
}

/// Why a prediction call produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// `success: false` with a structured error, whatever the HTTP status
    #[error("{code}: {message}")]
    Upstream { code: String, message: String },

    /// Non-2xx status without a structured error envelope
    #[error("API Error: {0}")]
    Status(u16),

    /// Network failure, undecodable body or an envelope that breaks the contract
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ApiFailure {
    pub fn code(&self) -> &str {
        match self {
            ApiFailure::Upstream { code, .. } => code,
            ApiFailure::Status(_) => "API_ERROR",
            ApiFailure::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }

    /// Message for the user: upstream text verbatim, otherwise a generic one
    pub fn user_message(&self) -> String {
        match self {
            ApiFailure::Upstream { message, .. } => message.clone(),
            ApiFailure::Status(status) => format!("API Error: {}", status),
            ApiFailure::Unexpected(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Interpret an HTTP status and body from the prediction service
pub fn interpret_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiFailure> {
    let ok_status = (200..300).contains(&status);

    let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !ok_status => return Err(ApiFailure::Status(status)),
        Err(e) => return Err(ApiFailure::Unexpected(e.to_string())),
    };

    if !envelope.success {
        if let Some(error) = envelope.error {
            return Err(ApiFailure::Upstream {
                code: error.code,
                message: error.message,
            });
        }
    }

    if !ok_status {
        return Err(ApiFailure::Status(status));
    }

    match (envelope.success, envelope.data) {
        (true, Some(data)) => {
            serde_json::from_value(data).map_err(|e| ApiFailure::Unexpected(e.to_string()))
        }
        (true, None) => Err(ApiFailure::Unexpected("success without data".to_string())),
        (false, _) => Err(ApiFailure::Unexpected("failure without error".to_string())),
    }
}
