//! Common types used across the dashboard

use serde::{Deserialize, Deserializer, Serialize};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Sort direction for rankings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Accept a form field sent either as a JSON string or as a JSON number.
///
/// HTML selects post their values as text while scripted clients tend to send
/// integers; both end up as the same string for the validator to parse.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        Some(Field::Text(s)) => s,
        Some(Field::Integer(n)) => n.to_string(),
        Some(Field::Float(f)) => f.to_string(),
        None => String::new(),
    })
}
