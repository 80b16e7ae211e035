//! View-local metrics over the predicted districts
//!
//! City-wide statistics come from the prediction service and are shown as
//! received. The metrics here only feed the explanatory charts.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::models::District;
use crate::tier::{classify, AirQualityTier};
use crate::types::SortOrder;

/// Number of districts in the most-polluted and cleanest charts
pub const TOP_N: usize = 5;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`)
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Standard deviation of `pm25_prediction` across districts
pub fn pm25_std_dev(districts: &[District]) -> Option<f64> {
    let values: Vec<f64> = districts.iter().map(|d| d.pm25_prediction).collect();
    population_std_dev(&values)
}

/// Field a ranking is ordered by
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankKey {
    #[default]
    Pm25,
    Population,
}

impl RankKey {
    /// Sort value, `None` when the district has none (unknown population, NaN)
    fn value(&self, district: &District) -> Option<f64> {
        let value = match self {
            RankKey::Pm25 => Some(district.pm25_prediction),
            RankKey::Population => district.population.map(|p| p as f64),
        };
        value.filter(|v| !v.is_nan())
    }
}

impl FromStr for RankKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pm25" => Ok(RankKey::Pm25),
            "population" => Ok(RankKey::Population),
            other => Err(other.to_string()),
        }
    }
}

/// Districts sorted by `key`, keeping input order among equal values.
///
/// Districts without a value for the key go last in either order.
pub fn rank_by(districts: &[District], key: RankKey, order: SortOrder, limit: usize) -> Vec<&District> {
    let mut sorted: Vec<(&District, Option<f64>)> =
        districts.iter().map(|d| (d, key.value(d))).collect();

    sorted.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    sorted.into_iter().take(limit).map(|(d, _)| d).collect()
}

/// Districts sorted by PM2.5, keeping input order among equal values
pub fn ranking(districts: &[District], order: SortOrder, limit: usize) -> Vec<&District> {
    rank_by(districts, RankKey::Pm25, order, limit)
}

/// Most polluted districts first
pub fn top_polluted(districts: &[District], n: usize) -> Vec<&District> {
    ranking(districts, SortOrder::Desc, n)
}

/// Cleanest districts first
pub fn top_cleanest(districts: &[District], n: usize) -> Vec<&District> {
    ranking(districts, SortOrder::Asc, n)
}

/// District count for one tier
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierCount {
    pub tier: AirQualityTier,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

/// Count of districts per tier, every tier listed in severity order
pub fn tier_distribution(districts: &[District]) -> Vec<TierCount> {
    let mut counts = [0usize; 5];
    for district in districts {
        let tier = classify(district.pm25_prediction);
        counts[tier as usize] += 1;
    }

    AirQualityTier::ALL
        .iter()
        .zip(counts)
        .map(|(tier, count)| TierCount {
            tier: *tier,
            label: tier.label_vi(),
            color: tier.color(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistrictId;

    fn district(id: u64, pm25: f64) -> District {
        District {
            id: DistrictId::Number(id),
            name: format!("Quận {}", id),
            name_en: format!("District {}", id),
            pm25_prediction: pm25,
            lat: 21.0,
            lon: 105.8,
            population: None,
            area_km2: None,
            district_type: None,
            raw_data: None,
        }
    }

    fn ids(districts: &[&District]) -> Vec<u64> {
        districts
            .iter()
            .map(|d| match d.id {
                DistrictId::Number(n) => n,
                DistrictId::Text(_) => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_population_std_dev() {
        let std = population_std_dev(&[10.0, 20.0, 30.0]).unwrap();
        assert!((std - 8.164_965_8).abs() < 1e-6);
        assert_eq!(population_std_dev(&[42.0]), Some(0.0));
        assert_eq!(population_std_dev(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_top_polluted_and_cleanest() {
        let districts: Vec<District> = [40.0, 10.0, 70.0, 25.0, 5.0, 90.0, 33.0]
            .iter()
            .enumerate()
            .map(|(i, pm)| district(i as u64 + 1, *pm))
            .collect();

        assert_eq!(ids(&top_polluted(&districts, TOP_N)), vec![6, 3, 1, 7, 4]);
        assert_eq!(ids(&top_cleanest(&districts, TOP_N)), vec![5, 2, 4, 7, 1]);
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let districts = vec![
            district(1, 20.0),
            district(2, 30.0),
            district(3, 20.0),
            district(4, 30.0),
        ];
        assert_eq!(ids(&top_polluted(&districts, 4)), vec![2, 4, 1, 3]);
        assert_eq!(ids(&top_cleanest(&districts, 4)), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_signed_zero_keeps_input_order() {
        let districts = vec![district(1, 0.0), district(2, -0.0), district(3, 0.0)];
        assert_eq!(ids(&top_cleanest(&districts, 3)), vec![1, 2, 3]);
        assert_eq!(ids(&top_polluted(&districts, 3)), vec![1, 2, 3]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let districts = vec![district(1, f64::NAN), district(2, 30.0), district(3, 10.0)];
        assert_eq!(ids(&top_polluted(&districts, 3)), vec![2, 3, 1]);
        assert_eq!(ids(&top_cleanest(&districts, 3)), vec![3, 2, 1]);
    }

    #[test]
    fn test_rank_by_population() {
        let mut districts = vec![district(1, 50.0), district(2, 20.0), district(3, 90.0), district(4, 10.0)];
        districts[0].population = Some(247_100);
        districts[1].population = Some(135_500);
        districts[2].population = None;
        districts[3].population = Some(247_100);

        let desc = rank_by(&districts, RankKey::Population, SortOrder::Desc, 4);
        assert_eq!(ids(&desc), vec![1, 4, 2, 3]);
        let asc = rank_by(&districts, RankKey::Population, SortOrder::Asc, 2);
        assert_eq!(ids(&asc), vec![2, 1]);
    }

    #[test]
    fn test_rank_key_from_str() {
        assert_eq!("pm25".parse::<RankKey>(), Ok(RankKey::Pm25));
        assert_eq!("population".parse::<RankKey>(), Ok(RankKey::Population));
        assert_eq!("area".parse::<RankKey>(), Err("area".to_string()));
    }

    #[test]
    fn test_ranking_shorter_than_limit() {
        let districts = vec![district(1, 20.0), district(2, 30.0)];
        assert_eq!(ranking(&districts, SortOrder::Desc, 10).len(), 2);
        assert!(ranking(&[], SortOrder::Asc, 5).is_empty());
    }

    #[test]
    fn test_tier_distribution_lists_every_tier() {
        let districts = vec![
            district(1, 8.0),
            district(2, 12.0),
            district(3, 40.0),
            district(4, 200.0),
        ];
        let counts: Vec<usize> = tier_distribution(&districts).iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0, 1]);
        assert_eq!(tier_distribution(&[]).len(), 5);
    }
}
