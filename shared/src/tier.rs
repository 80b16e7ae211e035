//! Air-quality tiers derived from a PM2.5 concentration
//!
//! `classify` is the only place a PM2.5 value is turned into a tier. Cards,
//! map markers, charts and the legend all read their color and label from
//! the tier it returns.

use serde::{Deserialize, Serialize};

/// WHO 24-hour guideline for PM2.5, µg/m³
pub const WHO_GUIDELINE_PM25: f64 = 15.0;

/// Upper bounds (inclusive) of Good, Moderate, Poor and Bad
pub const TIER_UPPER_BOUNDS: [f64; 4] = [12.0, 35.0, 55.0, 150.0];

/// Severity bucket, ordered from least to most severe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityTier {
    /// pm25 <= 12
    Good,
    /// 12 < pm25 <= 35
    Moderate,
    /// 35 < pm25 <= 55
    Poor,
    /// 55 < pm25 <= 150
    Bad,
    /// pm25 > 150
    VeryBad,
}

impl AirQualityTier {
    pub const ALL: [AirQualityTier; 5] = [
        AirQualityTier::Good,
        AirQualityTier::Moderate,
        AirQualityTier::Poor,
        AirQualityTier::Bad,
        AirQualityTier::VeryBad,
    ];

    /// Hex color used for markers, cards and chart bars
    pub fn color(&self) -> &'static str {
        match self {
            AirQualityTier::Good => "#00e400",
            AirQualityTier::Moderate => "#ffff00",
            AirQualityTier::Poor => "#ff7e00",
            AirQualityTier::Bad => "#ff0000",
            AirQualityTier::VeryBad => "#8f3f97",
        }
    }

    pub fn label_vi(&self) -> &'static str {
        match self {
            AirQualityTier::Good => "Tốt",
            AirQualityTier::Moderate => "Trung bình",
            AirQualityTier::Poor => "Kém",
            AirQualityTier::Bad => "Xấu",
            AirQualityTier::VeryBad => "Rất xấu",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            AirQualityTier::Good => "Good",
            AirQualityTier::Moderate => "Moderate",
            AirQualityTier::Poor => "Poor",
            AirQualityTier::Bad => "Bad",
            AirQualityTier::VeryBad => "Very Bad",
        }
    }

    /// Health advice shown on district cards
    pub fn advice(&self) -> &'static str {
        match self {
            AirQualityTier::Good => "Chất lượng không khí tốt, phù hợp cho mọi hoạt động ngoài trời",
            AirQualityTier::Moderate => {
                "Chất lượng không khí chấp nhận được, nhóm nhạy cảm nên hạn chế vận động mạnh ngoài trời"
            }
            AirQualityTier::Poor => "Nhóm nhạy cảm nên giảm thời gian hoạt động ngoài trời",
            AirQualityTier::Bad => "Mọi người nên hạn chế ra ngoài và đeo khẩu trang khi cần thiết",
            AirQualityTier::VeryBad => "Cảnh báo sức khỏe: tránh mọi hoạt động ngoài trời",
        }
    }

    /// PM2.5 range covered by the tier, for the legend
    pub fn range_label(&self) -> &'static str {
        match self {
            AirQualityTier::Good => "0 - 12",
            AirQualityTier::Moderate => "12.1 - 35",
            AirQualityTier::Poor => "35.1 - 55",
            AirQualityTier::Bad => "55.1 - 150",
            AirQualityTier::VeryBad => "> 150",
        }
    }

    pub fn info(&self) -> TierInfo {
        TierInfo {
            tier: *self,
            label: self.label_vi(),
            label_en: self.label_en(),
            color: self.color(),
            range: self.range_label(),
        }
    }
}

impl std::fmt::Display for AirQualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label_en())
    }
}

/// Classify a PM2.5 concentration (µg/m³); boundary values belong to the lower tier.
///
/// NaN never compares as within a bound, so it lands in `VeryBad` rather than
/// being presented as clean air.
pub fn classify(pm25: f64) -> AirQualityTier {
    let [good, moderate, poor, bad] = TIER_UPPER_BOUNDS;
    if pm25 <= good {
        AirQualityTier::Good
    } else if pm25 <= moderate {
        AirQualityTier::Moderate
    } else if pm25 <= poor {
        AirQualityTier::Poor
    } else if pm25 <= bad {
        AirQualityTier::Bad
    } else {
        AirQualityTier::VeryBad
    }
}

/// Legend entry for one tier
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierInfo {
    pub tier: AirQualityTier,
    pub label: &'static str,
    pub label_en: &'static str,
    pub color: &'static str,
    pub range: &'static str,
}

/// Legend entries in severity order
pub fn legend() -> Vec<TierInfo> {
    AirQualityTier::ALL.iter().map(AirQualityTier::info).collect()
}
