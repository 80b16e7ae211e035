//! District prediction models

use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// Stable district identity.
///
/// The prediction service numbers its districts, but the contract only
/// requires a unique non-empty key, so textual ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistrictId {
    Number(u64),
    Text(String),
}

impl DistrictId {
    pub fn is_empty(&self) -> bool {
        match self {
            DistrictId::Number(_) => false,
            DistrictId::Text(s) => s.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for DistrictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistrictId::Number(n) => write!(f, "{}", n),
            DistrictId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for DistrictId {
    fn from(n: u64) -> Self {
        DistrictId::Number(n)
    }
}

impl From<&str> for DistrictId {
    fn from(s: &str) -> Self {
        DistrictId::Text(s.to_string())
    }
}

/// PM2.5 prediction for one district
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub name_en: String,
    /// Predicted PM2.5 concentration in µg/m³
    pub pm25_prediction: f64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_km2: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub district_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawData>,
}

impl District {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Whether the prediction is above the WHO 24h guideline of 15 µg/m³
    pub fn exceeds_who_guideline(&self) -> bool {
        self.pm25_prediction > crate::WHO_GUIDELINE_PM25
    }
}

/// Observed measurements at the target hour.
///
/// Every field is optional: a missing value means the sensor or the upstream
/// API had nothing for that hour, which is not the same thing as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQualityReadings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReadings>,
}

/// Pollutant concentrations in µg/m³
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AirQualityReadings {
    #[serde(default)]
    pub co: Option<f64>,
    #[serde(default)]
    pub no: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub pm2_5: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub nh3: Option<f64>,
}

/// Surface weather observations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherReadings {
    /// °C
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    /// %
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    /// mm
    #[serde(default)]
    pub precipitation: Option<f64>,
    /// hPa
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    /// km/h
    #[serde(default)]
    pub windspeed_10m: Option<f64>,
    /// degrees
    #[serde(default)]
    pub winddirection_10m: Option<f64>,
    /// W/m²
    #[serde(default)]
    pub shortwave_radiation: Option<f64>,
}

/// A district the prediction service could not predict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedDistrict {
    pub id: DistrictId,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}
