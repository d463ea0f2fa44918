//! Baseline vs recent demand comparison
//!
//! Predicts daily demand over a window of years, reduces it to calendar
//! month means averaged across years, and compares two windows.

use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{ChangeReport, DailySeries, MonthlyProfile, RegionId, YearRange};
use crate::error::Result;
use crate::forecast::{DemandModel, TemperatureGuard};

/// A temperature series restricted to an inclusive range of years
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub temperatures: &'a DailySeries,
    pub years: YearRange,
}

impl<'a> Window<'a> {
    pub fn new(temperatures: &'a DailySeries, years: YearRange) -> Self {
        Self { temperatures, years }
    }
}

/// Clips, predicts, and aggregates demand for one region's model
pub struct PeriodAggregator<'a> {
    model: &'a DemandModel,
    guard: TemperatureGuard,
}

impl<'a> PeriodAggregator<'a> {
    pub fn new(model: &'a DemandModel, guard: TemperatureGuard) -> Self {
        Self { model, guard }
    }

    pub fn region(&self) -> &RegionId {
        &self.model.region
    }

    /// Predicted daily demand (GW) for every day of the series
    pub fn predict_daily(&self, temperatures: &DailySeries) -> Result<DailySeries> {
        let dates = temperatures.dates();
        let clipped = self.guard.clip(&self.model.region, &temperatures.values());
        let demand = self.model.predict_series(&clipped.values, &dates)?;
        Ok(DailySeries::from_samples(dates.into_iter().zip(demand)))
    }

    /// Calendar-month mean demand across the window's years
    pub fn monthly_profile(&self, window: Window<'_>) -> Result<MonthlyProfile> {
        let temps = window.temperatures.within_years(window.years);
        if temps.is_empty() {
            return Err(window.years.no_data());
        }

        debug!(
            region = %self.model.region,
            period = %window.years,
            days = temps.len(),
            "predicting demand for period"
        );

        let demand = self.predict_daily(&temps)?;
        Ok(monthly_means(&demand))
    }

    /// Absolute and percent change from the baseline window to the recent one
    pub fn compare(&self, baseline: Window<'_>, recent: Window<'_>) -> Result<ChangeReport> {
        let baseline_profile = self.monthly_profile(baseline)?;
        let recent_profile = self.monthly_profile(recent)?;
        Ok(ChangeReport::new(
            self.model.region.clone(),
            baseline_profile,
            recent_profile,
        ))
    }
}

/// Mean per (year, month), then mean of those across years per calendar month
pub fn monthly_means(daily: &DailySeries) -> MonthlyProfile {
    let mut per_year_month: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for (date, value) in daily.iter() {
        let entry = per_year_month
            .entry((date.year(), date.month()))
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut per_month: [(f64, usize); 12] = [(0.0, 0); 12];
    for ((_, month), (sum, count)) in per_year_month {
        let slot = &mut per_month[month as usize - 1];
        slot.0 += sum / count as f64;
        slot.1 += 1;
    }

    let mut months = [None; 12];
    for (i, (sum, count)) in per_month.iter().enumerate() {
        if *count > 0 {
            months[i] = Some(sum / *count as f64);
        }
    }
    MonthlyProfile::from_months(months)
}
