//! Persisted polynomial fit artifacts
//!
//! A `FitResult` is written once per (region, year, degree) by the curve
//! fitter and only read afterwards. The JSON layout matches the fit
//! collection files consumed by the demand and cost analyses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{PolynomialDegree, RegionId, MAX_DEGREE};
use crate::error::{AnalysisError, Result};

pub const CONSTANT_KEY: &str = "constant";
pub const WEEKDAY_KEY: &str = "weekday_effect";

/// Coefficient key for the `power`-th temperature term
pub fn term_key(power: usize) -> String {
    if power == 1 {
        "temperature".to_string()
    } else {
        format!("temperature^{power}")
    }
}

/// Coefficient mapping {constant, temperature, temperature^2, .., weekday_effect}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coefficients(pub BTreeMap<String, f64>);

impl Coefficients {
    /// Build from the constant, temperature terms (degree 1 first) and weekday effect
    pub fn from_terms(constant: f64, terms: &[f64], weekday_effect: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(CONSTANT_KEY.to_string(), constant);
        for (i, value) in terms.iter().enumerate() {
            map.insert(term_key(i + 1), *value);
        }
        map.insert(WEEKDAY_KEY.to_string(), weekday_effect);
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn constant(&self) -> Option<f64> {
        self.get(CONSTANT_KEY)
    }

    pub fn weekday_effect(&self) -> Option<f64> {
        self.get(WEEKDAY_KEY)
    }

    /// Highest temperature power with a coefficient present
    pub fn highest_power(&self) -> Option<usize> {
        (1..=MAX_DEGREE).rev().find(|k| self.0.contains_key(&term_key(*k)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDetails {
    pub max_degree: usize,
}

/// Goodness-of-fit diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    #[serde(rename = "rmse_GW")]
    pub rmse_gw: f64,
    pub r2: f64,
    pub n_days: usize,
}

/// Observed range of the data the fit was trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "min_temp_C")]
    pub min_temp_c: f64,
    #[serde(rename = "max_temp_C")]
    pub max_temp_c: f64,
    #[serde(rename = "avg_demand_GW")]
    pub avg_demand_gw: f64,
    #[serde(rename = "max_demand_GW")]
    pub max_demand_gw: f64,
}

/// Polynomial temperature-demand fit for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    #[serde(rename = "rto", alias = "zone_name")]
    pub region: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_details: Option<FitDetails>,
    pub coefficients: Coefficients,
    pub fit_statistics: FitStatistics,
    pub data_range: DataRange,
}

impl FitResult {
    /// Degree recorded with the fit, or inferred from the coefficient keys
    /// for artifacts written without `fit_details`.
    pub fn degree(&self) -> Result<PolynomialDegree> {
        match self.fit_details {
            Some(details) => PolynomialDegree::new(details.max_degree),
            None => {
                let highest = self.coefficients.highest_power().ok_or_else(|| {
                    AnalysisError::DegreeMismatch {
                        degree: 1,
                        key: term_key(1),
                    }
                })?;
                PolynomialDegree::new(highest)
            }
        }
    }
}

/// Summary counts stored alongside the fits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_degree: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub n_zones_total: usize,
    pub n_zones_successful: usize,
    pub n_zones_failed: usize,
}

/// The persisted fit collection: successful fits plus per-region failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitCollection {
    pub fits: Vec<FitResult>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub metadata: FitMetadata,
}

impl FitCollection {
    pub fn find(&self, region: &RegionId) -> Result<&FitResult> {
        self.fits
            .iter()
            .find(|fit| &fit.region == region)
            .ok_or_else(|| AnalysisError::MissingArtifact {
                kind: "polynomial fit",
                target: format!("no polynomial fit found for region {region}"),
            })
    }
}

/// Fit with fixed diagnostics and a -10..35 °C range, for tests
#[cfg(test)]
pub(crate) fn sample_fit(region: &str, constant: f64, terms: &[f64], weekday: f64) -> FitResult {
    FitResult {
        region: RegionId::from(region),
        fit_details: Some(FitDetails {
            max_degree: terms.len(),
        }),
        coefficients: Coefficients::from_terms(constant, terms, weekday),
        fit_statistics: FitStatistics {
            rmse_gw: 1.0,
            r2: 0.9,
            n_days: 366,
        },
        data_range: DataRange {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            min_temp_c: -10.0,
            max_temp_c: 35.0,
            avg_demand_gw: 40.0,
            max_demand_gw: 70.0,
        },
    }
}
