//! Display models built from a prediction result
//!
//! Cards, map markers, chart series and the legend each take their tier,
//! color and label from [`classify`]; none of them carries its own
//! thresholds. Renderers only lay these structures out.

use serde::Serialize;

use crate::analytics::{pm25_std_dev, tier_distribution, top_cleanest, top_polluted, TierCount, TOP_N};
use crate::models::{
    AirQualityReadings, CityStatistics, District, DistrictId, FailedDistrict, PredictionInfo,
    PredictionResult, WeatherReadings,
};
use crate::tier::{classify, legend, AirQualityTier, TierInfo};

/// Shown in place of a reading the upstream did not report
pub const UNKNOWN_READING: &str = "N/A";

/// Format an optional measurement; absent values are shown as unknown, never as 0
pub fn format_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1} {}", v, unit),
        _ => UNKNOWN_READING.to_string(),
    }
}

/// PM2.5 formatted for display, e.g. `42.2`
pub fn format_pm25(pm25: f64) -> String {
    format!("{:.1}", pm25)
}

/// One observed measurement on a district card
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reading {
    pub key: &'static str,
    pub label: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
    pub display: String,
}

impl Reading {
    fn new(key: &'static str, label: &'static str, value: Option<f64>, unit: &'static str) -> Self {
        Self {
            key,
            label,
            value,
            unit,
            display: format_reading(value, unit),
        }
    }
}

fn air_quality_readings(air: Option<&AirQualityReadings>) -> Vec<Reading> {
    let air = air.cloned().unwrap_or_default();
    vec![
        Reading::new("pm2_5", "PM2.5 quan trắc", air.pm2_5, "µg/m³"),
        Reading::new("pm10", "PM10", air.pm10, "µg/m³"),
        Reading::new("co", "CO", air.co, "µg/m³"),
        Reading::new("no", "NO", air.no, "µg/m³"),
        Reading::new("no2", "NO₂", air.no2, "µg/m³"),
        Reading::new("o3", "O₃", air.o3, "µg/m³"),
        Reading::new("so2", "SO₂", air.so2, "µg/m³"),
        Reading::new("nh3", "NH₃", air.nh3, "µg/m³"),
    ]
}

fn weather_readings(weather: Option<&WeatherReadings>) -> Vec<Reading> {
    let weather = weather.cloned().unwrap_or_default();
    vec![
        Reading::new("temperature_2m", "Nhiệt độ", weather.temperature_2m, "°C"),
        Reading::new("relative_humidity_2m", "Độ ẩm", weather.relative_humidity_2m, "%"),
        Reading::new("precipitation", "Lượng mưa", weather.precipitation, "mm"),
        Reading::new("pressure_msl", "Áp suất", weather.pressure_msl, "hPa"),
        Reading::new("windspeed_10m", "Tốc độ gió", weather.windspeed_10m, "km/h"),
        Reading::new("winddirection_10m", "Hướng gió", weather.winddirection_10m, "°"),
        Reading::new("shortwave_radiation", "Bức xạ", weather.shortwave_radiation, "W/m²"),
    ]
}

/// Summary card for one district
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistrictCard {
    pub id: DistrictId,
    pub name: String,
    pub name_en: String,
    pub pm25: f64,
    pub pm25_display: String,
    pub tier: AirQualityTier,
    pub label: &'static str,
    pub color: &'static str,
    pub advice: &'static str,
    pub exceeds_who: bool,
    pub observed_at: Option<String>,
    pub air_quality: Vec<Reading>,
    pub weather: Vec<Reading>,
}

impl DistrictCard {
    pub fn from_district(district: &District) -> Self {
        let tier = classify(district.pm25_prediction);
        let raw = district.raw_data.as_ref();
        Self {
            id: district.id.clone(),
            name: district.name.clone(),
            name_en: district.name_en.clone(),
            pm25: district.pm25_prediction,
            pm25_display: format_pm25(district.pm25_prediction),
            tier,
            label: tier.label_vi(),
            color: tier.color(),
            advice: tier.advice(),
            exceeds_who: district.exceeds_who_guideline(),
            observed_at: raw.and_then(|r| r.timestamp.clone()),
            air_quality: air_quality_readings(raw.and_then(|r| r.air_quality.as_ref())),
            weather: weather_readings(raw.and_then(|r| r.weather.as_ref())),
        }
    }
}

/// Pin on the district map
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapMarker {
    pub id: DistrictId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub pm25: f64,
    pub tier: AirQualityTier,
    pub color: &'static str,
    pub popup: String,
}

impl MapMarker {
    pub fn from_district(district: &District) -> Self {
        let tier = classify(district.pm25_prediction);
        Self {
            id: district.id.clone(),
            name: district.name.clone(),
            lat: district.lat,
            lon: district.lon,
            pm25: district.pm25_prediction,
            tier,
            color: tier.color(),
            popup: format!(
                "{}: {} µg/m³ ({})",
                district.name,
                format_pm25(district.pm25_prediction),
                tier.label_vi()
            ),
        }
    }
}

/// Bar in the per-district PM2.5 chart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartBar {
    pub id: DistrictId,
    pub name: String,
    pub pm25: f64,
    pub color: &'static str,
}

/// Entry in a top-N ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedDistrict {
    pub rank: usize,
    pub id: DistrictId,
    pub name: String,
    pub name_en: String,
    pub pm25: f64,
    pub tier: AirQualityTier,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
}

impl RankedDistrict {
    pub fn list(districts: &[&District]) -> Vec<RankedDistrict> {
        districts
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let tier = classify(d.pm25_prediction);
                RankedDistrict {
                    rank: i + 1,
                    id: d.id.clone(),
                    name: d.name.clone(),
                    name_en: d.name_en.clone(),
                    pm25: d.pm25_prediction,
                    tier,
                    color: tier.color(),
                    population: d.population,
                }
            })
            .collect()
    }
}

/// Series for the explanatory charts
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub bars: Vec<ChartBar>,
    pub tier_distribution: Vec<TierCount>,
    /// Population standard deviation, computed here rather than trusted from upstream
    pub std_dev: Option<f64>,
    pub top_polluted: Vec<RankedDistrict>,
    pub top_cleanest: Vec<RankedDistrict>,
}

impl ChartData {
    pub fn from_districts(districts: &[District]) -> Self {
        let bars = districts
            .iter()
            .map(|d| ChartBar {
                id: d.id.clone(),
                name: d.name.clone(),
                pm25: d.pm25_prediction,
                color: classify(d.pm25_prediction).color(),
            })
            .collect();

        Self {
            bars,
            tier_distribution: tier_distribution(districts),
            std_dev: pm25_std_dev(districts),
            top_polluted: RankedDistrict::list(&top_polluted(districts, TOP_N)),
            top_cleanest: RankedDistrict::list(&top_cleanest(districts, TOP_N)),
        }
    }
}

/// Everything the dashboard page shows for one prediction snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardView {
    pub prediction_info: PredictionInfo,
    pub statistics: CityStatistics,
    pub cards: Vec<DistrictCard>,
    pub markers: Vec<MapMarker>,
    pub charts: ChartData,
    pub legend: Vec<TierInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_districts: Vec<FailedDistrict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DashboardView {
    pub fn build(result: &PredictionResult) -> Self {
        Self {
            prediction_info: result.prediction_info.clone(),
            statistics: result.statistics.clone(),
            cards: result.districts.iter().map(DistrictCard::from_district).collect(),
            markers: result.districts.iter().map(MapMarker::from_district).collect(),
            charts: ChartData::from_districts(&result.districts),
            legend: legend(),
            failed_districts: result.errors.clone(),
            warning: result.warning.clone(),
        }
    }
}

/// GeoJSON point feature collection for map clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeoJsonCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub prediction_info: PredictionInfo,
    pub features: Vec<GeoJsonFeature>,
    pub statistics: CityStatistics,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: GeoJsonProperties,
    pub geometry: GeoJsonPoint,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeoJsonProperties {
    pub id: DistrictId,
    pub name: String,
    pub name_en: String,
    pub pm25: f64,
    pub tier: AirQualityTier,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_km2: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub district_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[lon, lat]` per RFC 7946
    pub coordinates: [f64; 2],
}

impl GeoJsonCollection {
    pub fn build(result: &PredictionResult) -> Self {
        let features = result
            .districts
            .iter()
            .map(|d| {
                let tier = classify(d.pm25_prediction);
                GeoJsonFeature {
                    kind: "Feature",
                    properties: GeoJsonProperties {
                        id: d.id.clone(),
                        name: d.name.clone(),
                        name_en: d.name_en.clone(),
                        pm25: d.pm25_prediction,
                        tier,
                        color: tier.color(),
                        population: d.population,
                        area_km2: d.area_km2,
                        district_type: d.district_type.clone(),
                    },
                    geometry: GeoJsonPoint {
                        kind: "Point",
                        coordinates: [d.lon, d.lat],
                    },
                }
            })
            .collect();

        Self {
            kind: "FeatureCollection",
            prediction_info: result.prediction_info.clone(),
            features,
            statistics: result.statistics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawData, WhoStandard};

    fn district(id: u64, pm25: f64) -> District {
        District {
            id: DistrictId::Number(id),
            name: format!("Quận {}", id),
            name_en: format!("District {}", id),
            pm25_prediction: pm25,
            lat: 21.0 + id as f64 / 100.0,
            lon: 105.8,
            population: Some(100_000),
            area_km2: None,
            district_type: Some("urban".to_string()),
            raw_data: None,
        }
    }

    fn result(values: &[f64]) -> PredictionResult {
        let districts: Vec<District> = values
            .iter()
            .enumerate()
            .map(|(i, v)| district(i as u64 + 1, *v))
            .collect();
        let above = values.iter().filter(|v| **v > 15.0).count();
        PredictionResult {
            prediction_info: PredictionInfo {
                target_time: "2024-01-15 09:00".to_string(),
                prediction_for: "2024-01-15 10:00".to_string(),
                explanation: "Sử dụng dữ liệu từ 07:00 - 09:00 để dự đoán PM2.5 lúc 10:00".to_string(),
                explanation_en: None,
                data_from: None,
            },
            statistics: CityStatistics {
                city_average: Some(20.0),
                who_standard_15: Some(WhoStandard {
                    above,
                    below: values.len() - above,
                }),
                ..Default::default()
            },
            districts,
            errors: Vec::new(),
            warning: None,
            execution_time_seconds: None,
            cache_info: None,
            model_info: None,
        }
    }

    #[test]
    fn test_unknown_readings_are_not_zero() {
        assert_eq!(format_reading(None, "µg/m³"), "N/A");
        assert_eq!(format_reading(Some(0.0), "mm"), "0.0 mm");
        assert_eq!(format_reading(Some(18.44), "°C"), "18.4 °C");
        assert_eq!(format_reading(Some(f64::NAN), "°C"), "N/A");
    }

    #[test]
    fn test_card_uses_classifier() {
        let mut d = district(1, 42.17);
        d.raw_data = Some(RawData {
            timestamp: Some("2024-01-15T09:00:00+07:00".to_string()),
            air_quality: Some(AirQualityReadings {
                pm2_5: Some(40.2),
                ..Default::default()
            }),
            weather: None,
        });
        let card = DistrictCard::from_district(&d);
        assert_eq!(card.tier, AirQualityTier::Poor);
        assert_eq!(card.color, AirQualityTier::Poor.color());
        assert_eq!(card.label, "Kém");
        assert_eq!(card.pm25_display, "42.2");
        assert!(card.exceeds_who);
        assert_eq!(card.air_quality[0].value, Some(40.2));
        assert_eq!(card.air_quality[1].display, "N/A");
        assert!(card.weather.iter().all(|r| r.value.is_none()));
    }

    #[test]
    fn test_marker_popup() {
        let marker = MapMarker::from_district(&district(2, 8.0));
        assert_eq!(marker.tier, AirQualityTier::Good);
        assert_eq!(marker.popup, "Quận 2: 8.0 µg/m³ (Tốt)");
    }

    #[test]
    fn test_views_agree_on_tier() {
        let view = DashboardView::build(&result(&[5.0, 12.0, 35.5, 60.0, 151.0, 20.0]));
        for (card, marker) in view.cards.iter().zip(&view.markers) {
            assert_eq!(card.tier, marker.tier);
            assert_eq!(card.color, marker.color);
        }
        for (bar, card) in view.charts.bars.iter().zip(&view.cards) {
            assert_eq!(bar.color, card.color);
        }
        assert_eq!(view.legend.len(), 5);
        assert_eq!(view.charts.top_polluted.len(), 5);
        assert_eq!(view.charts.top_polluted[0].pm25, 151.0);
        assert_eq!(view.charts.top_polluted[0].rank, 1);
        assert_eq!(view.charts.top_cleanest[0].pm25, 5.0);
    }

    #[test]
    fn test_dashboard_keeps_upstream_statistics() {
        let view = DashboardView::build(&result(&[10.0, 20.0, 30.0]));
        assert_eq!(view.statistics.city_average, Some(20.0));
        let std = view.charts.std_dev.unwrap();
        assert!((std - 8.165).abs() < 1e-3);
    }

    #[test]
    fn test_geojson_coordinates_are_lon_lat() {
        let collection = GeoJsonCollection::build(&result(&[10.0]));
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["geometry"]["type"], "Point");
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 105.8);
        assert_eq!(json["features"][0]["properties"]["type"], "urban");
    }
}
