use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::RegionId;
use crate::error::{AnalysisError, Result};

/// Piecewise-linear wholesale price as a function of demand.
///
/// Segment `i` prices demand `d` as `slopes[i] * d + intercepts[i]` ($/MWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCurve {
    /// Segment start points (GW), strictly ascending
    pub breakpoints: Vec<f64>,
    /// $/MWh per GW
    pub slopes: Vec<f64>,
    /// $/MWh
    pub intercepts: Vec<f64>,
}

impl PriceCurve {
    pub fn new(breakpoints: Vec<f64>, slopes: Vec<f64>, intercepts: Vec<f64>) -> Self {
        Self {
            breakpoints,
            slopes,
            intercepts,
        }
    }

    /// Check array lengths and breakpoint ordering
    pub fn validate(&self, region: &RegionId) -> Result<()> {
        let invalid = |reason: String| AnalysisError::InvalidPriceCurve {
            region: region.to_string(),
            reason,
        };

        if self.breakpoints.is_empty() {
            return Err(invalid("no breakpoints".to_string()));
        }
        if self.slopes.len() != self.breakpoints.len()
            || self.intercepts.len() != self.breakpoints.len()
        {
            return Err(invalid(format!(
                "{} breakpoints, {} slopes, {} intercepts",
                self.breakpoints.len(),
                self.slopes.len(),
                self.intercepts.len()
            )));
        }
        if self.breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("breakpoints are not strictly ascending".to_string()));
        }
        Ok(())
    }

    /// Price ($/MWh) at the given demand (GW).
    ///
    /// Below the first breakpoint the first segment is extrapolated and
    /// floored at zero; above the last breakpoint the last segment is
    /// extrapolated unclamped. Segments are closed on both ends, so demand
    /// exactly on an interior breakpoint is priced by the lower segment.
    pub fn price_at(&self, demand_gw: f64) -> f64 {
        let n = self.breakpoints.len();
        if n == 0 {
            return 0.0;
        }

        if demand_gw < self.breakpoints[0] {
            return self.segment(0, demand_gw).max(0.0);
        }
        if demand_gw > self.breakpoints[n - 1] {
            return self.segment(n - 1, demand_gw);
        }

        for i in 0..n.saturating_sub(1) {
            if self.breakpoints[i] <= demand_gw && demand_gw <= self.breakpoints[i + 1] {
                return self.segment(i, demand_gw);
            }
        }

        // Single-breakpoint curve with demand exactly on it
        self.segment(0, demand_gw)
    }

    fn segment(&self, i: usize, demand_gw: f64) -> f64 {
        self.slopes[i] * demand_gw + self.intercepts[i]
    }
}

/// Price curves keyed by region id, as stored in the price curve artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceCurveSet(pub BTreeMap<String, PriceCurve>);

impl PriceCurveSet {
    pub fn find(&self, region: &RegionId) -> Result<&PriceCurve> {
        let curve = self
            .0
            .get(region.as_str())
            .ok_or_else(|| AnalysisError::MissingArtifact {
                kind: "price curve",
                target: format!("no price curve found for region {region}"),
            })?;
        curve.validate(region)?;
        Ok(curve)
    }
}

/// Hourly values keyed by (local date, hour number)
pub type HourlySeries = BTreeMap<(NaiveDate, u32), f64>;

pub const HOURS_PER_DAY: usize = 24;

/// Daily mean demand and demand-weighted average price for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceDemand {
    pub region: RegionId,
    pub date: NaiveDate,
    pub demand_gw: f64,
    /// $/MWh
    pub weighted_price: f64,
}

/// Join hourly prices and demand (MW) and reduce to one row per complete day.
///
/// Only days with exactly 24 joined hours are kept.
pub fn daily_weighted_prices(
    region: &RegionId,
    prices: &HourlySeries,
    demand_mw: &HourlySeries,
) -> Vec<DailyPriceDemand> {
    let mut days: BTreeMap<NaiveDate, (usize, f64, f64)> = BTreeMap::new();
    for (key, demand) in demand_mw {
        if let Some(price) = prices.get(key) {
            let day = days.entry(key.0).or_insert((0, 0.0, 0.0));
            day.0 += 1;
            day.1 += demand;
            day.2 += price * demand;
        }
    }

    days.into_iter()
        .filter(|(_, (hours, total, _))| *hours == HOURS_PER_DAY && *total != 0.0)
        .map(|(date, (_, total, weighted))| DailyPriceDemand {
            region: region.clone(),
            date,
            demand_gw: total / HOURS_PER_DAY as f64 / 1_000.0,
            weighted_price: weighted / total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn curve() -> PriceCurve {
        PriceCurve::new(vec![10.0, 50.0], vec![1.0, 2.0], vec![0.0, -40.0])
    }

    #[rstest]
    #[case::below_range(5.0, 5.0)]
    #[case::first_segment(30.0, 30.0)]
    #[case::lower_breakpoint(10.0, 10.0)]
    #[case::upper_breakpoint(50.0, 50.0)]
    #[case::above_range(60.0, 80.0)]
    fn test_price_at(#[case] demand: f64, #[case] expected: f64) {
        assert_eq!(curve().price_at(demand), expected);
    }

    #[test]
    fn test_breakpoint_matches_adjoining_segment() {
        let c = curve();
        // The lower segment's formula prices an interior breakpoint
        assert_eq!(c.price_at(50.0), 1.0 * 50.0 + 0.0);
        assert_ne!(c.price_at(50.0), 2.0 * 50.0 - 40.0);
        // Just above the last breakpoint the last segment takes over
        assert!((c.price_at(50.0 + 1e-9) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_below_range_is_floored_at_zero() {
        let c = PriceCurve::new(vec![10.0, 50.0], vec![2.0, 2.0], vec![-30.0, -30.0]);
        assert_eq!(c.price_at(5.0), 0.0);
        // Above range is not clamped
        let c = PriceCurve::new(vec![10.0, 50.0], vec![1.0, -1.0], vec![0.0, 0.0]);
        assert_eq!(c.price_at(60.0), -60.0);
    }

    #[test]
    fn test_validate() {
        let region = RegionId::from("ERCOT");
        assert!(curve().validate(&region).is_ok());

        let bad = PriceCurve::new(vec![10.0, 5.0], vec![1.0, 2.0], vec![0.0, 0.0]);
        assert!(matches!(
            bad.validate(&region),
            Err(AnalysisError::InvalidPriceCurve { .. })
        ));

        let bad = PriceCurve::new(vec![10.0, 50.0], vec![1.0], vec![0.0, 0.0]);
        assert!(bad.validate(&region).is_err());
    }

    #[test]
    fn test_curve_set_lookup() {
        let json = r#"{"ERCOT": {"breakpoints": [10.0, 50.0], "slopes": [1.0, 2.0], "intercepts": [0.0, -40.0]}}"#;
        let set: PriceCurveSet = serde_json::from_str(json).unwrap();

        assert!(set.find(&RegionId::from("ERCOT")).is_ok());
        assert!(matches!(
            set.find(&RegionId::from("PJM")),
            Err(AnalysisError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_daily_weighted_prices_keeps_complete_days() {
        let d1 = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        let mut prices = HourlySeries::new();
        let mut demand = HourlySeries::new();
        for hour in 1..=24 {
            // Half the hours at 20 GW and $10, half at 60 GW and $50
            let (mw, price) = if hour <= 12 { (20_000.0, 10.0) } else { (60_000.0, 50.0) };
            prices.insert((d1, hour), price);
            demand.insert((d1, hour), mw);
            if hour != 24 {
                prices.insert((d2, hour), price);
                demand.insert((d2, hour), mw);
            }
        }
        // Demand without a matching price is dropped by the join
        demand.insert((d2, 24), 1.0);

        let rows = daily_weighted_prices(&RegionId::from("NYISO"), &prices, &demand);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, d1);
        assert_eq!(rows[0].demand_gw, 40.0);
        // (12*20k*10 + 12*60k*50) / (12*80k) = 40
        assert_eq!(rows[0].weighted_price, 40.0);
    }
}
