//! Error handling for the PM2.5 dashboard server
//!
//! Every failure is rendered as `{ "success": false, "error": { ... } }` with a
//! Vietnamese `message` for the page and an English `message_en` for logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{ApiFailure, DashboardError, ErrorKind, GENERIC_FAILURE_MESSAGE, REQUEST_IN_PROGRESS};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error {code}: {message}")]
    Validation { code: String, message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid sort key: {0}")]
    InvalidSort(String),

    #[error("A prediction request is already in progress")]
    RequestInProgress,

    #[error("No prediction data available")]
    NoPredictionData,

    #[error("District not found: {0}")]
    DistrictNotFound(String),

    // Prediction service errors
    #[error("Prediction service error {code}: {message}")]
    Upstream { code: String, message: String },

    #[error("Prediction service returned status {0}")]
    UpstreamStatus(u16),

    #[error("Unexpected prediction service response: {0}")]
    Unexpected(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub message_en: String,
}

impl From<ApiFailure> for AppError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Upstream { code, message } => AppError::Upstream { code, message },
            ApiFailure::Status(status) => AppError::UpstreamStatus(status),
            ApiFailure::Unexpected(reason) => AppError::Unexpected(reason),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(error: DashboardError) -> Self {
        match error.kind {
            ErrorKind::Validation => AppError::Validation {
                code: error.code,
                message: error.message,
            },
            ErrorKind::InProgress => AppError::RequestInProgress,
            ErrorKind::Api => AppError::Upstream {
                code: error.code,
                message: error.message,
            },
            ErrorKind::Unexpected => AppError::Unexpected(error.message),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidQuery(_) | AppError::InvalidSort(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RequestInProgress => StatusCode::CONFLICT,
            AppError::NoPredictionData | AppError::DistrictNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } | AppError::UpstreamStatus(_) | AppError::Unexpected(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            AppError::Validation { code, message } => ErrorDetail {
                code: code.clone(),
                message: message.clone(),
                message_en: format!("Target time rejected: {}", code),
            },
            AppError::InvalidQuery(msg) => ErrorDetail {
                code: "INVALID_QUERY".to_string(),
                message: "Tham số truy vấn không hợp lệ".to_string(),
                message_en: format!("Invalid query parameters: {}", msg),
            },
            AppError::InvalidSort(key) => ErrorDetail {
                code: "INVALID_SORT".to_string(),
                message: format!("Tham số sort_by không hợp lệ: {}", key),
                message_en: format!("Invalid sort_by parameter: {}", key),
            },
            AppError::RequestInProgress => ErrorDetail {
                code: REQUEST_IN_PROGRESS.to_string(),
                message: DashboardError::in_progress().message,
                message_en: "A prediction request is already in progress".to_string(),
            },
            AppError::NoPredictionData => ErrorDetail {
                code: "NO_PREDICTION_DATA".to_string(),
                message: "Chưa có dữ liệu dự đoán. Vui lòng chọn thời gian và dự đoán".to_string(),
                message_en: "No prediction has been made yet".to_string(),
            },
            AppError::DistrictNotFound(id) => ErrorDetail {
                code: "DISTRICT_NOT_FOUND".to_string(),
                message: format!("Không tìm thấy quận/huyện có ID {}", id),
                message_en: format!("No district with id {} in the current prediction", id),
            },
            AppError::Upstream { code, message } => ErrorDetail {
                code: code.clone(),
                message: message.clone(),
                message_en: format!("Prediction service error: {}", code),
            },
            AppError::UpstreamStatus(status) => ErrorDetail {
                code: "API_ERROR".to_string(),
                message: format!("API Error: {}", status),
                message_en: format!("API Error: {}", status),
            },
            AppError::Unexpected(reason) => ErrorDetail {
                code: "UNEXPECTED_ERROR".to_string(),
                message: GENERIC_FAILURE_MESSAGE.to_string(),
                message_en: format!("Unexpected prediction service response: {}", reason),
            },
            AppError::Configuration(msg) => ErrorDetail {
                code: "CONFIGURATION_ERROR".to_string(),
                message: GENERIC_FAILURE_MESSAGE.to_string(),
                message_en: format!("Configuration error: {}", msg),
            },
            AppError::Internal(msg) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: GENERIC_FAILURE_MESSAGE.to_string(),
                message_en: msg.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
