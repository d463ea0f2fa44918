use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AnalysisError, Result};

// ============================================================================
// Identifiers
// ============================================================================

/// Grid operating region identifier (e.g. "ERCOT", "PJM")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Polynomial degree
// ============================================================================

/// Highest supported polynomial degree for the temperature response
pub const MAX_DEGREE: usize = 4;

/// Polynomial degree of a temperature-demand fit, always in `1..=MAX_DEGREE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PolynomialDegree(usize);

impl PolynomialDegree {
    pub fn new(degree: usize) -> Result<Self> {
        if (1..=MAX_DEGREE).contains(&degree) {
            Ok(Self(degree))
        } else {
            Err(AnalysisError::InvalidDegree(degree))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for PolynomialDegree {
    type Error = AnalysisError;

    fn try_from(value: usize) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PolynomialDegree> for usize {
    fn from(d: PolynomialDegree) -> Self {
        d.0
    }
}

impl fmt::Display for PolynomialDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Year ranges
// ============================================================================

/// Inclusive range of calendar years, e.g. the 1951-1980 baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// True if the two ranges share at least one year
    pub fn overlaps(&self, other: &YearRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn no_data(&self) -> AnalysisError {
        AnalysisError::NoData {
            start_year: self.start,
            end_year: self.end,
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ============================================================================
// Daily series
// ============================================================================

/// Ordered daily series with at most one value per calendar date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    /// Reduce (possibly sub-daily) samples to daily means.
    ///
    /// Non-finite samples are ignored; a date with no finite samples is absent.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (date, value) in samples {
            if !value.is_finite() {
                continue;
            }
            let entry = sums.entry(date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let points = sums
            .into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().copied()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|(_, v)| v).sum::<f64>() / self.points.len() as f64)
    }

    /// Restrict to days inside the inclusive year range
    pub fn within_years(&self, range: YearRange) -> DailySeries {
        DailySeries {
            points: self
                .points
                .iter()
                .filter(|(d, _)| range.contains(d.year()))
                .copied()
                .collect(),
        }
    }

    /// Restrict to days in the given calendar months (1-12)
    pub fn within_months(&self, months: &[u32]) -> DailySeries {
        DailySeries {
            points: self
                .points
                .iter()
                .filter(|(d, _)| months.contains(&d.month()))
                .copied()
                .collect(),
        }
    }

    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> DailySeries {
        DailySeries {
            points: self.points.iter().map(|(d, v)| (*d, f(*v))).collect(),
        }
    }
}

/// One region's daily temperature and demand history
#[derive(Debug, Clone)]
pub struct RegionSeries {
    pub region: RegionId,
    /// Daily mean temperature (°C)
    pub temperature: DailySeries,
    /// Daily mean demand (GW)
    pub demand: DailySeries,
}

impl RegionSeries {
    pub fn new(region: RegionId, temperature: DailySeries, demand: DailySeries) -> Self {
        Self {
            region,
            temperature,
            demand,
        }
    }

    /// (date, temperature, demand) triples for dates present in both series
    pub fn aligned(&self) -> Vec<(NaiveDate, f64, f64)> {
        self.demand
            .iter()
            .filter_map(|(date, demand)| {
                self.temperature
                    .get(date)
                    .map(|temperature| (date, temperature, demand))
            })
            .collect()
    }
}
