//! Validation of the prediction target time
//!
//! The prediction service can only answer for instants where observations
//! already exist upstream: not in the future, not within the last 30 minutes
//! (the weather API needs that long to sync), and not older than 90 days.
//! All times here are wall-clock times in the dashboard's timezone.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{PredictionForm, PredictionRequest};

/// Minimum age of a target instant before its data is available
pub const DATA_AVAILABILITY_BUFFER_MINUTES: i64 = 30;

/// Oldest target instant the prediction service retains data for
pub const MAX_HISTORY_DAYS: i64 = 90;

/// Why a target time was rejected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    MissingDate,
    InvalidInput,
    FutureTime,
    TimeTooRecent,
    TimeTooOld,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::MissingDate => "MISSING_DATE",
            ValidationErrorCode::InvalidInput => "INVALID_INPUT",
            ValidationErrorCode::FutureTime => "FUTURE_TIME",
            ValidationErrorCode::TimeTooRecent => "TIME_TOO_RECENT",
            ValidationErrorCode::TimeTooOld => "TIME_TOO_OLD",
        }
    }
}

impl std::fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating a target time.
///
/// Built only through [`ValidationResult::accepted`] and
/// [`ValidationResult::rejected`], so a code is present exactly when the
/// result is invalid.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ValidationErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_time: Option<NaiveDateTime>,
}

impl ValidationResult {
    pub fn accepted(target: NaiveDateTime) -> Self {
        Self {
            valid: true,
            error_code: None,
            error_message: None,
            target_time: Some(target),
        }
    }

    pub fn rejected(
        code: ValidationErrorCode,
        message: impl Into<String>,
        target: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            valid: false,
            error_code: Some(code),
            error_message: Some(message.into()),
            target_time: target,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn error_code(&self) -> Option<ValidationErrorCode> {
        self.error_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn target_time(&self) -> Option<NaiveDateTime> {
        self.target_time
    }

    /// The accepted target instant, or the rejection code and message
    pub fn into_result(self) -> Result<NaiveDateTime, (ValidationErrorCode, String)> {
        match (self.valid, self.target_time, self.error_code) {
            (true, Some(target), _) => Ok(target),
            (_, _, Some(code)) => Err((code, self.error_message.unwrap_or_default())),
            _ => Err((
                ValidationErrorCode::InvalidInput,
                messages::invalid_input().to_string(),
            )),
        }
    }
}

/// User-facing Vietnamese messages
pub mod messages {
    use chrono::NaiveDateTime;

    pub fn missing_date() -> &'static str {
        "Vui lòng chọn ngày"
    }

    pub fn invalid_input() -> &'static str {
        "Dữ liệu đầu vào không hợp lệ"
    }

    pub fn future_time(now: NaiveDateTime, minutes_ahead: i64) -> String {
        format!(
            "Không thể dự đoán tương lai! Thời gian hiện tại là {}, thời gian bạn chọn còn {} phút nữa mới tới.",
            now.format("%H:%M ngày %d/%m/%Y"),
            minutes_ahead
        )
    }

    pub fn time_too_recent(wait_minutes: i64, cutoff: NaiveDateTime) -> String {
        format!(
            "Dữ liệu chưa sẵn sàng. Vui lòng đợi thêm {} phút hoặc chọn thời gian trước {}",
            wait_minutes,
            cutoff.format("%H:%M")
        )
    }

    pub fn time_too_old() -> &'static str {
        "Thời gian quá xa trong quá khứ. Chỉ hỗ trợ dữ liệu trong vòng 90 ngày gần đây"
    }
}

/// Validate a date/hour/minute selection against `now`.
///
/// Rules run in a fixed order and the first match wins: missing date,
/// unparseable input, future time, too recent, too old.
pub fn validate_prediction_time(
    date: &str,
    hour: &str,
    minute: &str,
    now: NaiveDateTime,
) -> ValidationResult {
    if date.trim().is_empty() {
        return ValidationResult::rejected(
            ValidationErrorCode::MissingDate,
            messages::missing_date(),
            None,
        );
    }

    match compose_target(date, hour, minute) {
        Some(target) => validate_target(target, now),
        None => ValidationResult::rejected(
            ValidationErrorCode::InvalidInput,
            messages::invalid_input(),
            None,
        ),
    }
}

/// Validate a form as posted by the dashboard
pub fn validate_form(form: &PredictionForm, now: NaiveDateTime) -> ValidationResult {
    validate_prediction_time(&form.date, &form.hour, &form.minute, now)
}

impl PredictionRequest {
    /// Validate a structured request the same way as a form selection
    pub fn validate_at(&self, now: NaiveDateTime) -> ValidationResult {
        if self.validate().is_err() {
            return ValidationResult::rejected(
                ValidationErrorCode::InvalidInput,
                messages::invalid_input(),
                None,
            );
        }
        match self.target_instant() {
            Some(target) => validate_target(target, now),
            None => ValidationResult::rejected(
                ValidationErrorCode::InvalidInput,
                messages::invalid_input(),
                None,
            ),
        }
    }
}

/// Apply the time-window rules to a composed target instant
pub fn validate_target(target: NaiveDateTime, now: NaiveDateTime) -> ValidationResult {
    if target > now {
        return ValidationResult::rejected(
            ValidationErrorCode::FutureTime,
            messages::future_time(now, ceil_minutes(target - now)),
            Some(target),
        );
    }

    let cutoff = now - Duration::minutes(DATA_AVAILABILITY_BUFFER_MINUTES);
    if target > cutoff {
        return ValidationResult::rejected(
            ValidationErrorCode::TimeTooRecent,
            messages::time_too_recent(ceil_minutes(target - cutoff), cutoff),
            Some(target),
        );
    }

    let oldest_allowed = now - Duration::days(MAX_HISTORY_DAYS);
    if target < oldest_allowed {
        return ValidationResult::rejected(
            ValidationErrorCode::TimeTooOld,
            messages::time_too_old(),
            Some(target),
        );
    }

    ValidationResult::accepted(target)
}

/// Parse `YYYY-MM-DD` plus hour and minute text into a wall-clock instant
pub fn compose_target(date: &str, hour: &str, minute: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// Whole minutes in a positive span, rounded up: 1 second counts as a minute
pub fn ceil_minutes(span: Duration) -> i64 {
    let whole = span.num_minutes();
    if span > Duration::minutes(whole) {
        whole + 1
    } else {
        whole
    }
}
