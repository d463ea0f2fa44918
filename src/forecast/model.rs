//! Demand prediction from a stored polynomial fit

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::features::{is_weekday, temperature_powers};
use crate::domain::{term_key, FitResult, PolynomialDegree, RegionId, CONSTANT_KEY, WEEKDAY_KEY};
use crate::error::{AnalysisError, Result};

/// Polynomial temperature-demand model resolved from a `FitResult`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandModel {
    pub region: RegionId,
    pub degree: PolynomialDegree,
    pub constant: f64,
    /// Coefficients of t^1..t^d (GW/°C^k)
    pub terms: Vec<f64>,
    pub weekday_effect: f64,
}

impl DemandModel {
    /// Resolve the coefficients of a degree-`degree` fit.
    ///
    /// Fails with `DegreeMismatch` if the fit was made at another degree,
    /// carries a temperature term above `degree`, or lacks a required key.
    pub fn from_fit(fit: &FitResult, degree: PolynomialDegree) -> Result<Self> {
        let mismatch = |power: usize| AnalysisError::DegreeMismatch {
            degree: degree.get(),
            key: term_key(power),
        };
        let encoded = fit.degree()?;
        if encoded < degree {
            return Err(mismatch(encoded.get() + 1));
        }
        if encoded > degree {
            return Err(mismatch(degree.get() + 1));
        }
        if let Some(highest) = fit.coefficients.highest_power() {
            if highest > degree.get() {
                return Err(mismatch(degree.get() + 1));
            }
        }

        let lookup = |key: &str| {
            fit.coefficients
                .get(key)
                .ok_or_else(|| AnalysisError::DegreeMismatch {
                    degree: degree.get(),
                    key: key.to_string(),
                })
        };

        let constant = lookup(CONSTANT_KEY)?;
        let terms = (1..=degree.get())
            .map(|k| lookup(&term_key(k)))
            .collect::<Result<Vec<f64>>>()?;
        let weekday_effect = lookup(WEEKDAY_KEY)?;

        Ok(Self {
            region: fit.region.clone(),
            degree,
            constant,
            terms,
            weekday_effect,
        })
    }

    /// Model at the degree recorded with the fit
    pub fn from_fit_default(fit: &FitResult) -> Result<Self> {
        Self::from_fit(fit, fit.degree()?)
    }

    /// Predicted daily mean demand (GW), floored at zero.
    ///
    /// `temperature` is expected to be range-clipped already.
    pub fn predict(&self, temperature: f64, is_weekday: bool) -> f64 {
        let polynomial: f64 = temperature_powers(temperature, self.terms.len())
            .iter()
            .zip(self.terms.iter())
            .map(|(p, c)| p * c)
            .sum();
        let weekday = if is_weekday { self.weekday_effect } else { 0.0 };

        (self.constant + polynomial + weekday).max(0.0)
    }

    /// Predict one value per (temperature, date), using each date's weekday flag
    pub fn predict_series(&self, temperatures: &[f64], dates: &[NaiveDate]) -> Result<Vec<f64>> {
        if temperatures.len() != dates.len() {
            return Err(AnalysisError::Shape {
                temperatures: temperatures.len(),
                dates: dates.len(),
            });
        }

        Ok(temperatures
            .iter()
            .zip(dates.iter())
            .map(|(t, d)| self.predict(*t, is_weekday(*d)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fit::sample_fit;
    use proptest::prelude::*;
    use rstest::rstest;

    const TERMS: [f64; 4] = [0.8, -0.05, 0.002, -0.00003];

    fn manual(t: f64, degree: usize, weekday: bool) -> f64 {
        let mut y = 40.0;
        for k in 1..=degree {
            y += TERMS[k - 1] * t.powi(k as i32);
        }
        if weekday {
            y += 3.0;
        }
        y
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn test_predict_matches_polynomial(#[case] degree: usize) {
        let fit = sample_fit("MISO", 40.0, &TERMS[..degree], 3.0);
        let model = DemandModel::from_fit(&fit, PolynomialDegree::new(degree).unwrap()).unwrap();

        for t in [-15.0, 0.0, 12.5, 30.0, 42.0] {
            for weekday in [true, false] {
                let expected = manual(t, degree, weekday).max(0.0);
                assert!((model.predict(t, weekday) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_negative_demand_is_clamped() {
        let fit = sample_fit("CAISO", -5.0, &[0.1], 1.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        assert_eq!(model.predict(0.0, false), 0.0);
        assert_eq!(model.predict(0.0, true), 0.0);
        assert!((model.predict(70.0, true) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_degree_mismatch() {
        let fit = sample_fit("NYISO", 20.0, &[0.1, 0.01], 1.0);
        let err = DemandModel::from_fit(&fit, PolynomialDegree::new(3).unwrap()).unwrap_err();
        match err {
            AnalysisError::DegreeMismatch { degree, key } => {
                assert_eq!(degree, 3);
                assert_eq!(key, "temperature^3");
            }
            other => panic!("unexpected error: {other}"),
        }

    }

    #[test]
    fn test_lower_degree_than_fit_is_rejected() {
        let fit = sample_fit("MISO", 10.0, &[1.0, 1.0, 1.0], 0.0);
        let err = DemandModel::from_fit(&fit, PolynomialDegree::new(1).unwrap()).unwrap_err();
        match err {
            AnalysisError::DegreeMismatch { degree, key } => {
                assert_eq!(degree, 1);
                assert_eq!(key, "temperature^2");
            }
            other => panic!("unexpected error: {other}"),
        }

        let model = DemandModel::from_fit(&fit, PolynomialDegree::new(3).unwrap()).unwrap();
        assert!((model.predict(2.0, false) - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_surplus_term_key_is_rejected() {
        let mut fit = sample_fit("PJM", 10.0, &[1.0, 1.0], 0.0);
        fit.coefficients.0.insert(term_key(3), 0.5);
        let err = DemandModel::from_fit(&fit, PolynomialDegree::new(2).unwrap()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegreeMismatch { key, .. } if key == "temperature^3"));
    }

    #[test]
    fn test_predict_series_uses_weekday_per_date() {
        let fit = sample_fit("SPP", 10.0, &[0.0], 2.0);
        let model = DemandModel::from_fit_default(&fit).unwrap();
        let dates = [
            NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(), // Friday
            NaiveDate::from_ymd_opt(2024, 7, 6).unwrap(), // Saturday
        ];

        let predictions = model.predict_series(&[20.0, 20.0], &dates).unwrap();
        assert_eq!(predictions, vec![12.0, 10.0]);

        let err = model.predict_series(&[20.0], &dates).unwrap_err();
        assert!(matches!(err, AnalysisError::Shape { .. }));
    }

    proptest! {
        #[test]
        fn prop_predict_matches_manual_sum(t in -40.0f64..50.0, degree in 1usize..=4, weekday: bool) {
            let fit = sample_fit("PJM", 40.0, &TERMS[..degree], 3.0);
            let model = DemandModel::from_fit_default(&fit).unwrap();
            let expected = manual(t, degree, weekday).max(0.0);
            prop_assert!((model.predict(t, weekday) - expected).abs() < 1e-9 * (1.0 + expected.abs()));
        }
    }
}
