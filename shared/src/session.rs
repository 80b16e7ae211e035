//! Dashboard session state
//!
//! One prediction snapshot, one error slot and one loading flag. A
//! submission starts with [`DashboardSession::begin`], which hands back the
//! request to send, and ends with [`DashboardSession::complete`]. While a
//! request is outstanding further submissions are refused, never queued.
//! A result that lands after [`DashboardSession::clear`] is not kept.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ApiFailure, PredictionForm, PredictionRequest, PredictionResult};
use crate::validation::{validate_form, ValidationErrorCode};

pub const REQUEST_IN_PROGRESS: &str = "REQUEST_IN_PROGRESS";

/// Error taxonomy shown to the user
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected locally, the prediction service was not contacted
    Validation,
    /// Non-2xx or `success: false` from the prediction service
    Api,
    /// Network failure, malformed JSON
    Unexpected,
    /// A submission is already outstanding
    InProgress,
}

/// The single active error of a session
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DashboardError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl DashboardError {
    pub fn validation(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: code.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn in_progress() -> Self {
        Self {
            kind: ErrorKind::InProgress,
            code: REQUEST_IN_PROGRESS.to_string(),
            message: "Đang xử lý yêu cầu trước đó, vui lòng đợi".to_string(),
        }
    }
}

impl From<ApiFailure> for DashboardError {
    fn from(failure: ApiFailure) -> Self {
        let kind = match failure {
            ApiFailure::Upstream { .. } | ApiFailure::Status(_) => ErrorKind::Api,
            ApiFailure::Unexpected(_) => ErrorKind::Unexpected,
        };
        Self {
            kind,
            code: failure.code().to_string(),
            message: failure.user_message(),
        }
    }
}

/// Process-local dashboard state, discarded on navigation away
#[derive(Debug, Default)]
pub struct DashboardSession {
    current: Option<Arc<PredictionResult>>,
    last_error: Option<DashboardError>,
    loading: bool,
    /// Bumped by `clear`; a submission only lands in the generation it began in
    generation: u64,
    pending_generation: Option<u64>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a submission: clear the error slot, validate, raise the loading flag.
    ///
    /// A refused submission (already loading) leaves the session untouched.
    pub fn begin(
        &mut self,
        form: &PredictionForm,
        now: NaiveDateTime,
    ) -> Result<PredictionRequest, DashboardError> {
        if self.loading {
            return Err(DashboardError::in_progress());
        }

        self.last_error = None;
        match validate_form(form, now).into_result() {
            Ok(target) => {
                self.loading = true;
                self.pending_generation = Some(self.generation);
                Ok(PredictionRequest::from_target(target))
            }
            Err((code, message)) => {
                let error = DashboardError::validation(code, message);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Finish the outstanding submission; a success replaces the snapshot wholesale.
    ///
    /// The outcome is still handed back when the session was cleared in the
    /// meantime, but it is not stored.
    pub fn complete(
        &mut self,
        outcome: Result<PredictionResult, ApiFailure>,
    ) -> Result<Arc<PredictionResult>, DashboardError> {
        self.loading = false;
        let current = self.pending_generation.take() == Some(self.generation);

        match outcome {
            Ok(result) => {
                let snapshot = Arc::new(result);
                if current {
                    self.current = Some(Arc::clone(&snapshot));
                }
                Ok(snapshot)
            }
            Err(failure) => {
                let error = DashboardError::from(failure);
                if current {
                    self.last_error = Some(error.clone());
                }
                Err(error)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current(&self) -> Option<Arc<PredictionResult>> {
        self.current.clone()
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    /// Discard snapshot and error, including whatever the outstanding request returns
    pub fn clear(&mut self) {
        self.current = None;
        self.last_error = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityStatistics, PredictionInfo};

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn result(target: &str) -> PredictionResult {
        PredictionResult {
            prediction_info: PredictionInfo {
                target_time: target.to_string(),
                prediction_for: target.to_string(),
                explanation: String::new(),
                explanation_en: None,
                data_from: None,
            },
            districts: Vec::new(),
            statistics: CityStatistics::default(),
            errors: Vec::new(),
            warning: None,
            execution_time_seconds: None,
            cache_info: None,
            model_info: None,
        }
    }

    #[test]
    fn test_successful_submission_replaces_snapshot() {
        let mut session = DashboardSession::new();
        let request = session
            .begin(&PredictionForm::new("2024-01-15", "9", "0"), now())
            .unwrap();
        assert_eq!((request.year, request.month, request.day), (2024, 1, 15));
        assert_eq!((request.hour, request.minute), (9, 0));
        assert!(session.is_loading());

        session.complete(Ok(result("first"))).unwrap();
        assert!(!session.is_loading());

        session
            .begin(&PredictionForm::new("2024-01-15", "8", "0"), now())
            .unwrap();
        session.complete(Ok(result("second"))).unwrap();
        assert_eq!(session.current().unwrap().prediction_info.target_time, "second");
    }

    #[test]
    fn test_submission_refused_while_loading() {
        let mut session = DashboardSession::new();
        let form = PredictionForm::new("2024-01-15", "9", "0");
        session.begin(&form, now()).unwrap();

        let refused = session.begin(&form, now()).unwrap_err();
        assert_eq!(refused.kind, ErrorKind::InProgress);
        assert_eq!(refused.code, REQUEST_IN_PROGRESS);
        assert!(session.last_error().is_none());
        assert!(session.is_loading());
    }

    #[test]
    fn test_validation_error_does_not_raise_loading() {
        let mut session = DashboardSession::new();
        let error = session.begin(&PredictionForm::default(), now()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(error.code, "MISSING_DATE");
        assert!(!session.is_loading());
        assert_eq!(session.last_error(), Some(&error));
    }

    #[test]
    fn test_failure_keeps_previous_snapshot_and_next_attempt_clears_error() {
        let mut session = DashboardSession::new();
        let form = PredictionForm::new("2024-01-15", "9", "0");
        session.begin(&form, now()).unwrap();
        session.complete(Ok(result("kept"))).unwrap();

        session.begin(&form, now()).unwrap();
        let error = session.complete(Err(ApiFailure::Status(502))).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Api);
        assert_eq!(error.message, "API Error: 502");
        assert_eq!(session.current().unwrap().prediction_info.target_time, "kept");
        assert!(session.last_error().is_some());

        session.begin(&form, now()).unwrap();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_unexpected_failure_message_is_generic() {
        let error = DashboardError::from(ApiFailure::Unexpected("expected value at line 1".into()));
        assert_eq!(error.kind, ErrorKind::Unexpected);
        assert_eq!(error.message, crate::models::GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_result_arriving_after_clear_is_dropped() {
        let mut session = DashboardSession::new();
        let form = PredictionForm::new("2024-01-15", "9", "0");
        session.begin(&form, now()).unwrap();
        session.clear();

        let returned = session.complete(Ok(result("stale"))).unwrap();
        assert_eq!(returned.prediction_info.target_time, "stale");
        assert!(session.current().is_none());
        assert!(!session.is_loading());

        session.begin(&form, now()).unwrap();
        session.clear();
        session.complete(Err(ApiFailure::Status(500))).unwrap_err();
        assert!(session.last_error().is_none());

        session.begin(&form, now()).unwrap();
        session.complete(Ok(result("fresh"))).unwrap();
        assert_eq!(session.current().unwrap().prediction_info.target_time, "fresh");
    }

    #[test]
    fn test_clear_discards_state() {
        let mut session = DashboardSession::new();
        session.begin(&PredictionForm::default(), now()).unwrap_err();
        session.clear();
        assert!(session.current().is_none());
        assert!(session.last_error().is_none());
    }
}
