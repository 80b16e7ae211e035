//! Prediction request and result contract

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::district::{District, DistrictId, FailedDistrict};
use crate::types::string_or_number;

/// Body of `POST /api/v2/predict/all`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PredictionRequest {
    #[validate(range(min = 1970, max = 9999))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 1, max = 31))]
    pub day: u32,
    #[validate(range(max = 23))]
    pub hour: u32,
    #[serde(default)]
    #[validate(range(max = 59))]
    pub minute: u32,
    /// Upstream weather API key, forwarded when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl PredictionRequest {
    /// Build a request for the given wall-clock instant
    pub fn from_target(target: NaiveDateTime) -> Self {
        use chrono::{Datelike, Timelike};

        Self {
            year: target.year(),
            month: target.month(),
            day: target.day(),
            hour: target.hour(),
            minute: target.minute(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Compose the target instant, `None` when the fields do not form a real date/time
    pub fn target_instant(&self) -> Option<NaiveDateTime> {
        if self.validate().is_err() {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            0,
        )
    }
}

/// Date/hour/minute as selected in the dashboard form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionForm {
    /// `YYYY-MM-DD`, empty when nothing was picked
    #[serde(default, deserialize_with = "string_or_number")]
    pub date: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hour: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub minute: String,
}

impl PredictionForm {
    pub fn new(date: impl Into<String>, hour: impl Into<String>, minute: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            hour: hour.into(),
            minute: minute.into(),
        }
    }
}

/// Result of a successful `predict/all` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub prediction_info: PredictionInfo,
    pub districts: Vec<District>,
    pub statistics: CityStatistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FailedDistrict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_info: Option<CacheInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

/// What instant the numbers represent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionInfo {
    pub target_time: String,
    pub prediction_for: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_from: Option<DataWindow>,
}

/// The three observation hours fed to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataWindow {
    #[serde(rename = "t-2")]
    pub t_minus_2: String,
    #[serde(rename = "t-1")]
    pub t_minus_1: String,
    #[serde(rename = "t-0")]
    pub t_0: String,
}

/// City-wide aggregates computed by the prediction service.
///
/// The aggregates are absent when no district could be predicted; the
/// service then reports an `error` instead of numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CityStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_districts_successful: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_districts_expected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_districts_failed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who_standard_15: Option<WhoStandard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy_threshold_55: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Districts above/below the WHO 15 µg/m³ guideline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoStandard {
    pub above: usize,
    pub below: usize,
}

impl WhoStandard {
    pub fn total(&self) -> usize {
        self.above + self.below
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheInfo {
    pub cached: bool,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    #[serde(rename = "type", default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub rmse: Option<f64>,
    #[serde(default)]
    pub r2: Option<f64>,
}

/// A way in which a prediction result breaks its contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("district at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate district id {0}")]
    DuplicateId(DistrictId),

    #[error("district {id} has invalid pm25_prediction {value}")]
    InvalidPm25 { id: DistrictId, value: f64 },

    #[error("district {id} has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { id: DistrictId, lat: f64, lon: f64 },

    #[error("statistics are missing for {districts} predicted districts")]
    MissingStatistics { districts: usize },

    #[error("WHO partition {above} + {below} does not match {districts} districts")]
    WhoPartitionMismatch {
        above: usize,
        below: usize,
        districts: usize,
    },
}

impl PredictionResult {
    /// Collect every contract violation in the result, in district order
    pub fn check_contract(&self) -> Vec<ContractViolation> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for (index, district) in self.districts.iter().enumerate() {
            if district.id.is_empty() {
                violations.push(ContractViolation::EmptyId { index });
            } else if !seen.insert(&district.id) {
                violations.push(ContractViolation::DuplicateId(district.id.clone()));
            }

            let pm25 = district.pm25_prediction;
            if !pm25.is_finite() || pm25 < 0.0 {
                violations.push(ContractViolation::InvalidPm25 {
                    id: district.id.clone(),
                    value: pm25,
                });
            }

            if !district.location().is_valid() {
                violations.push(ContractViolation::InvalidCoordinates {
                    id: district.id.clone(),
                    lat: district.lat,
                    lon: district.lon,
                });
            }
        }

        let districts = self.districts.len();
        match self.statistics.who_standard_15 {
            Some(who) if who.total() != districts => {
                violations.push(ContractViolation::WhoPartitionMismatch {
                    above: who.above,
                    below: who.below,
                    districts,
                });
            }
            None if districts > 0 => {
                violations.push(ContractViolation::MissingStatistics { districts });
            }
            _ => {}
        }

        violations
    }

    pub fn is_well_formed(&self) -> bool {
        self.check_contract().is_empty()
    }

    pub fn district(&self, id: &DistrictId) -> Option<&District> {
        self.districts.iter().find(|d| &d.id == id)
    }

    pub fn pm25_values(&self) -> Vec<f64> {
        self.districts.iter().map(|d| d.pm25_prediction).collect()
    }
}
