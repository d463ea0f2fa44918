//! Curve fitting for the temperature-demand relationship
//!
//! Ordinary least squares of daily demand on the polynomial design matrix,
//! one fit per region.

use chrono::NaiveDate;
use itertools::{Itertools, MinMaxResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::FeatureBuilder;
use super::metrics::FitMetrics;
use crate::domain::{
    Coefficients, DataRange, FitDetails, FitResult, FitStatistics, PolynomialDegree, RegionId,
    RegionSeries,
};
use crate::error::{AnalysisError, Result};

/// Minimum number of valid days required for a fit
pub const MIN_VALID_DAYS: usize = 30;

/// Region-specific plausibility bounds on daily demand (GW), inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandFilter {
    pub min_demand_gw: Option<f64>,
    pub max_demand_gw: Option<f64>,
}

impl DemandFilter {
    pub fn accepts(&self, demand_gw: f64) -> bool {
        self.min_demand_gw.map_or(true, |min| demand_gw >= min)
            && self.max_demand_gw.map_or(true, |max| demand_gw <= max)
    }
}

/// Curve fitting configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitConfig {
    pub degree: PolynomialDegree,
    pub min_valid_days: usize,
}

impl FitConfig {
    pub fn new(degree: PolynomialDegree) -> Self {
        Self {
            degree,
            min_valid_days: MIN_VALID_DAYS,
        }
    }
}

/// Fits per-region polynomial temperature-demand curves
pub struct CurveFitter {
    config: FitConfig,
    features: FeatureBuilder,
}

impl CurveFitter {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            features: FeatureBuilder::new(config.degree),
        }
    }

    /// Fit a region's aligned daily temperature and demand history
    pub fn fit(&self, series: &RegionSeries, filter: &DemandFilter) -> Result<FitResult> {
        let samples = series.aligned();
        if samples.is_empty() {
            return Err(AnalysisError::NoOverlap {
                region: series.region.to_string(),
            });
        }
        self.fit_samples(&series.region, &samples, filter)
    }

    /// Fit (date, temperature °C, demand GW) samples
    pub fn fit_samples(
        &self,
        region: &RegionId,
        samples: &[(NaiveDate, f64, f64)],
        filter: &DemandFilter,
    ) -> Result<FitResult> {
        let valid: Vec<(NaiveDate, f64, f64)> = samples
            .iter()
            .copied()
            .filter(|(_, t, d)| t.is_finite() && d.is_finite())
            .filter(|(_, _, d)| *d > 0.0)
            .filter(|(_, _, d)| filter.accepts(*d))
            .collect();

        debug!(
            region = %region,
            samples = samples.len(),
            valid = valid.len(),
            "filtered fit samples"
        );

        if valid.len() < self.config.min_valid_days {
            return Err(AnalysisError::InsufficientData {
                valid: valid.len(),
                required: self.config.min_valid_days,
            });
        }

        let dates: Vec<NaiveDate> = valid.iter().map(|(d, _, _)| *d).collect();
        let temps: Vec<f64> = valid.iter().map(|(_, t, _)| *t).collect();
        let demand: Vec<f64> = valid.iter().map(|(_, _, y)| *y).collect();

        let x = self.features.design_matrix(&temps, &dates)?;
        let y = DVector::from_column_slice(&demand);
        let beta = solve_scaled_least_squares(&x, &y).ok_or(AnalysisError::SingularDesign {
            samples: x.nrows(),
            columns: x.ncols(),
        })?;

        let fitted = &x * &beta;
        let metrics = FitMetrics::calculate(&demand, fitted.as_slice())?;

        let degree = self.config.degree.get();
        let terms: Vec<f64> = beta.iter().take(degree).copied().collect();
        let weekday_effect = beta[degree];
        let constant = beta[degree + 1];

        let (start_date, end_date) = match dates.iter().copied().minmax() {
            MinMaxResult::NoElements => {
                return Err(AnalysisError::InsufficientData {
                    valid: 0,
                    required: self.config.min_valid_days.max(1),
                })
            }
            MinMaxResult::OneElement(d) => (d, d),
            MinMaxResult::MinMax(first, last) => (first, last),
        };
        let (min_temp_c, max_temp_c) = bounds(&temps);
        let (_, max_demand_gw) = bounds(&demand);
        let avg_demand_gw = demand.iter().sum::<f64>() / demand.len() as f64;

        info!(
            region = %region,
            degree,
            days = valid.len(),
            metrics = %metrics,
            weekday_effect_gw = format!("{:.2}", weekday_effect),
            temp_range = format!("{:.1}°C to {:.1}°C", min_temp_c, max_temp_c),
            "fitted temperature-demand curve"
        );

        Ok(FitResult {
            region: region.clone(),
            fit_details: Some(FitDetails { max_degree: degree }),
            coefficients: Coefficients::from_terms(constant, &terms, weekday_effect),
            fit_statistics: FitStatistics {
                rmse_gw: metrics.rmse,
                r2: metrics.r2,
                n_days: valid.len(),
            },
            data_range: DataRange {
                start_date,
                end_date,
                min_temp_c,
                max_temp_c,
                avg_demand_gw,
                max_demand_gw,
            },
        })
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    match values.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => (f64::NAN, f64::NAN),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    }
}

/// Least squares with each column scaled to unit max magnitude.
///
/// Temperature powers span several orders of magnitude (t^4 at 40 °C is
/// 2.56e6), so columns are normalized before the SVD solve and the
/// coefficients rescaled afterwards.
pub fn solve_scaled_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let scales: Vec<f64> = x
        .column_iter()
        .map(|col| {
            let m = col.amax();
            if m > 0.0 {
                m
            } else {
                1.0
            }
        })
        .collect();

    let mut scaled = x.clone();
    for (j, scale) in scales.iter().enumerate() {
        for i in 0..scaled.nrows() {
            scaled[(i, j)] /= scale;
        }
    }

    let beta = solve_least_squares(&scaled, y)?;
    Some(DVector::from_iterator(
        beta.len(),
        beta.iter().zip(scales.iter()).map(|(b, s)| b / s),
    ))
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DailySeries;
    use crate::forecast::features::is_weekday;
    use rstest::rstest;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    /// A year of synthetic days: demand = 5 + 0.1 t + 0.01 t^2 + 1.5 weekday + noise
    fn synthetic_samples(n: usize, noise: f64) -> Vec<(NaiveDate, f64, f64)> {
        (0..n)
            .map(|i| {
                let date = start() + chrono::Duration::days(i as i64);
                let phase = 2.0 * std::f64::consts::PI * i as f64 / 365.0;
                let t = 12.0 - 14.0 * phase.cos() + 3.0 * (i as f64 * 0.37).sin();
                let weekday = if is_weekday(date) { 1.0 } else { 0.0 };
                let y = 5.0 + 0.1 * t + 0.01 * t * t + 1.5 * weekday
                    + noise * (i as f64 * 1.7).sin();
                (date, t, y)
            })
            .collect()
    }

    fn fitter(degree: usize) -> CurveFitter {
        CurveFitter::new(FitConfig::new(PolynomialDegree::new(degree).unwrap()))
    }

    #[test]
    fn test_recovers_quadratic_coefficients() {
        let samples = synthetic_samples(365, 0.01);
        let fit = fitter(2)
            .fit_samples(&RegionId::from("TEST"), &samples, &DemandFilter::default())
            .unwrap();

        let c = &fit.coefficients;
        assert!((c.constant().unwrap() - 5.0).abs() < 0.05);
        assert!((c.get("temperature").unwrap() - 0.1).abs() < 0.01);
        assert!((c.get("temperature^2").unwrap() - 0.01).abs() < 0.001);
        assert!((c.weekday_effect().unwrap() - 1.5).abs() < 0.01);
        assert!(fit.fit_statistics.r2 > 0.999);
        assert!(fit.fit_statistics.rmse_gw < 0.02);
        assert_eq!(fit.fit_statistics.n_days, 365);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    fn test_higher_degrees_fit_exact_quadratic(#[case] degree: usize) {
        let samples = synthetic_samples(365, 0.0);
        let fit = fitter(degree)
            .fit_samples(&RegionId::from("TEST"), &samples, &DemandFilter::default())
            .unwrap();

        assert_eq!(fit.degree().unwrap().get(), degree);
        assert_eq!(fit.coefficients.0.len(), degree + 2);
        if degree >= 2 {
            assert!(fit.fit_statistics.r2 > 0.999_999);
        } else {
            assert!(fit.fit_statistics.r2 > 0.5);
        }
    }

    #[test]
    fn test_minimum_sample_count() {
        let samples = synthetic_samples(30, 0.01);
        let region = RegionId::from("TEST");

        assert!(fitter(1)
            .fit_samples(&region, &samples, &DemandFilter::default())
            .is_ok());

        let err = fitter(1)
            .fit_samples(&region, &samples[..29], &DemandFilter::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                valid: 29,
                required: 30
            }
        ));
    }

    #[test]
    fn test_discards_invalid_and_filtered_samples() {
        let mut samples = synthetic_samples(40, 0.0);
        samples[0].2 = 0.0;
        samples[1].2 = -3.0;
        samples[2].1 = f64::NAN;
        samples[3].2 = f64::NAN;
        let region = RegionId::from("TEST");

        let fit = fitter(1)
            .fit_samples(&region, &samples, &DemandFilter::default())
            .unwrap();
        assert_eq!(fit.fit_statistics.n_days, 36);

        // Bounds remove enough days to drop below the minimum
        let filter = DemandFilter {
            min_demand_gw: Some(7.0),
            max_demand_gw: None,
        };
        let err = fitter(1).fit_samples(&region, &samples, &filter).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn test_data_range() {
        let samples = synthetic_samples(60, 0.0);
        let fit = fitter(2)
            .fit_samples(&RegionId::from("TEST"), &samples, &DemandFilter::default())
            .unwrap();

        let min_t = samples.iter().map(|s| s.1).fold(f64::INFINITY, f64::min);
        let max_t = samples.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(fit.data_range.min_temp_c, min_t);
        assert_eq!(fit.data_range.max_temp_c, max_t);
        assert_eq!(fit.data_range.start_date, start());
        assert_eq!(fit.data_range.end_date, start() + chrono::Duration::days(59));
        assert!(fit.data_range.max_demand_gw >= fit.data_range.avg_demand_gw);
    }

    #[test]
    fn test_data_range_from_unordered_samples() {
        let mut samples = synthetic_samples(60, 0.0);
        samples.reverse();
        samples.swap(0, 30);
        let fit = fitter(1)
            .fit_samples(&RegionId::from("TEST"), &samples, &DemandFilter::default())
            .unwrap();

        assert_eq!(fit.data_range.start_date, start());
        assert_eq!(fit.data_range.end_date, start() + chrono::Duration::days(59));
    }

    #[test]
    fn test_no_overlap() {
        let temperature = DailySeries::from_samples(vec![(start(), 10.0)]);
        let demand =
            DailySeries::from_samples(vec![(start() + chrono::Duration::days(1), 40.0)]);
        let series = RegionSeries::new(RegionId::from("CAISO"), temperature, demand);

        let err = fitter(1).fit(&series, &DemandFilter::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoOverlap { .. }));
    }

    #[test]
    fn test_demand_filter() {
        let pjm = DemandFilter {
            min_demand_gw: Some(40.0),
            max_demand_gw: None,
        };
        assert!(!pjm.accepts(39.9));
        assert!(pjm.accepts(40.0));

        let ercot = DemandFilter {
            min_demand_gw: None,
            max_demand_gw: Some(80.0),
        };
        assert!(ercot.accepts(80.0));
        assert!(!ercot.accepts(80.1));
    }

    #[test]
    fn test_solve_least_squares() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_scaled_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);

        // Underdetermined
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        assert!(solve_least_squares(&x, &DVector::from_row_slice(&[1.0])).is_none());
    }
}
