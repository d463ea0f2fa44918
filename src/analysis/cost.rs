//! Wholesale cost of predicted demand
//!
//! Daily demand is priced through the region's piecewise-linear price curve,
//! summed per calendar year over the configured months, and the mean annual
//! totals of the baseline and recent windows are compared.

use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

use super::period::PeriodAggregator;
use crate::domain::{percent_change, CostReport, DailySeries, PriceCurve, YearRange};
use crate::error::Result;
use crate::forecast::{DemandModel, TemperatureGuard};

/// MWh delivered by one GW sustained over a day
pub const MWH_PER_GW_DAY: f64 = 24_000.0;

/// June through September
pub const DEFAULT_COST_MONTHS: [u32; 4] = [6, 7, 8, 9];

/// Cost (USD) of one day at `demand_gw` and `price` $/MWh
pub fn daily_cost(demand_gw: f64, price: f64) -> f64 {
    demand_gw * MWH_PER_GW_DAY * price
}

pub struct CostEstimator<'a> {
    aggregator: PeriodAggregator<'a>,
    curve: &'a PriceCurve,
    months: Vec<u32>,
}

impl<'a> CostEstimator<'a> {
    pub fn new(
        model: &'a DemandModel,
        guard: TemperatureGuard,
        curve: &'a PriceCurve,
        months: &[u32],
    ) -> Self {
        Self {
            aggregator: PeriodAggregator::new(model, guard),
            curve,
            months: months.to_vec(),
        }
    }

    /// Total cost per calendar year over the configured months
    pub fn annual_costs(&self, temperatures: &DailySeries) -> Result<BTreeMap<i32, f64>> {
        let season = temperatures.within_months(&self.months);
        let demand = self.aggregator.predict_daily(&season)?;

        let mut totals = BTreeMap::new();
        for (date, demand_gw) in demand.iter() {
            let price = self.curve.price_at(demand_gw);
            *totals.entry(date.year()).or_insert(0.0) += daily_cost(demand_gw, price);
        }
        Ok(totals)
    }

    /// Mean annual cost in each window and the change between them
    pub fn estimate(
        &self,
        temperatures: &DailySeries,
        baseline: YearRange,
        recent: YearRange,
    ) -> Result<CostReport> {
        let annual = self.annual_costs(temperatures)?;
        let (baseline_usd, baseline_years) = window_mean(&annual, baseline)?;
        let (recent_usd, recent_years) = window_mean(&annual, recent)?;

        let report = CostReport {
            region: self.aggregator.region().clone(),
            baseline_usd,
            recent_usd,
            change_usd: recent_usd - baseline_usd,
            percent_change: percent_change(baseline_usd, recent_usd),
            baseline_years,
            recent_years,
        };

        debug!(
            region = %report.region,
            baseline_usd = report.baseline_usd,
            recent_usd = report.recent_usd,
            "estimated cost change"
        );
        Ok(report)
    }
}

fn window_mean(annual: &BTreeMap<i32, f64>, years: YearRange) -> Result<(f64, usize)> {
    let totals: Vec<f64> = annual
        .range(years.start..=years.end)
        .map(|(_, total)| *total)
        .collect();
    if totals.is_empty() {
        return Err(years.no_data());
    }
    Ok((totals.iter().sum::<f64>() / totals.len() as f64, totals.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fit::sample_fit;
    use crate::error::AnalysisError;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_curve(price: f64) -> PriceCurve {
        PriceCurve::new(vec![0.0], vec![0.0], vec![price])
    }

    #[test]
    fn test_daily_cost() {
        // 10 GW for a day at $50/MWh
        assert_eq!(daily_cost(10.0, 50.0), 12_000_000.0);
    }

    #[test]
    fn test_annual_costs_only_sum_configured_months() {
        // Constant 10 GW regardless of temperature or weekday
        let fit = sample_fit("CAISO", 10.0, &[0.0], 0.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let curve = flat_curve(50.0);
        let estimator = CostEstimator::new(
            &model,
            TemperatureGuard::for_fit(&fit, Some(50.0)),
            &curve,
            &DEFAULT_COST_MONTHS,
        );

        let temps = DailySeries::from_samples(vec![
            (day(2020, 1, 15), 5.0),
            (day(2020, 7, 1), 30.0),
            (day(2020, 7, 2), 31.0),
            (day(2021, 8, 1), 29.0),
        ]);

        let annual = estimator.annual_costs(&temps).unwrap();
        assert_eq!(annual.len(), 2);
        assert_eq!(annual[&2020], 2.0 * 12_000_000.0);
        assert_eq!(annual[&2021], 12_000_000.0);
    }

    #[test]
    fn test_estimate_averages_annual_totals_per_window() {
        let fit = sample_fit("PJM", 10.0, &[0.0], 0.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let curve = flat_curve(50.0);
        let estimator = CostEstimator::new(
            &model,
            TemperatureGuard::for_fit(&fit, Some(50.0)),
            &curve,
            &[7],
        );

        let temps = DailySeries::from_samples(vec![
            (day(1960, 7, 1), 25.0),
            (day(1961, 7, 1), 25.0),
            (day(1961, 7, 2), 25.0),
            (day(2020, 7, 1), 30.0),
            (day(2020, 7, 2), 30.0),
            (day(2020, 7, 3), 30.0),
        ]);

        let report = estimator
            .estimate(&temps, YearRange::new(1951, 1980), YearRange::new(2015, 2024))
            .unwrap();

        assert_eq!(report.baseline_years, 2);
        assert_eq!(report.recent_years, 1);
        assert_eq!(report.baseline_usd, 1.5 * 12_000_000.0);
        assert_eq!(report.recent_usd, 3.0 * 12_000_000.0);
        assert_eq!(report.change_usd, 1.5 * 12_000_000.0);
        assert_eq!(report.percent_change, Some(100.0));
    }

    #[test]
    fn test_price_curve_drives_cost() {
        // Demand 30 + t: 20 °C -> 50 GW, priced on the lower segment at the breakpoint
        let fit = sample_fit("ERCOT", 30.0, &[1.0], 0.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let curve = PriceCurve::new(vec![10.0, 50.0], vec![1.0, 2.0], vec![0.0, -40.0]);
        let estimator = CostEstimator::new(
            &model,
            TemperatureGuard::for_fit(&fit, Some(50.0)),
            &curve,
            &[7],
        );

        let temps = DailySeries::from_samples(vec![(day(2020, 7, 4), 20.0)]);
        let annual = estimator.annual_costs(&temps).unwrap();
        assert_eq!(annual[&2020], daily_cost(50.0, 50.0));
    }

    #[test]
    fn test_window_without_years_is_no_data() {
        let fit = sample_fit("SPP", 10.0, &[0.0], 0.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let curve = flat_curve(40.0);
        let estimator = CostEstimator::new(
            &model,
            TemperatureGuard::for_fit(&fit, None),
            &curve,
            &DEFAULT_COST_MONTHS,
        );

        let temps = DailySeries::from_samples(vec![(day(2020, 7, 1), 25.0)]);
        let err = estimator
            .estimate(&temps, YearRange::new(1951, 1980), YearRange::new(2015, 2024))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoData { start_year: 1951, .. }));
    }

    #[test]
    fn test_zero_baseline_cost_has_undefined_percent() {
        let fit = sample_fit("MISO", 10.0, &[0.0], 0.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let curve = flat_curve(0.0);
        let estimator = CostEstimator::new(
            &model,
            TemperatureGuard::for_fit(&fit, None),
            &curve,
            &[7],
        );

        let temps = DailySeries::from_samples(vec![
            (day(1970, 7, 1), 25.0),
            (day(2020, 7, 1), 25.0),
        ]);
        let report = estimator
            .estimate(&temps, YearRange::new(1951, 1980), YearRange::new(2015, 2024))
            .unwrap();
        assert_eq!(report.baseline_usd, 0.0);
        assert_eq!(report.percent_change, None);
    }
}
