//! Feature engineering for the temperature-demand regression
//!
//! Each daily sample becomes one row of the design matrix:
//! `t, t^2, .., t^d, weekday, constant`.

use chrono::{Datelike, NaiveDate};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{term_key, PolynomialDegree, CONSTANT_KEY, WEEKDAY_KEY};
use crate::error::{AnalysisError, Result};

/// Monday through Friday
pub fn is_weekday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

/// Regressors for one (date, temperature) sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Temperature powers t^1..t^d
    pub powers: Vec<f64>,
    /// 1.0 on weekdays, 0.0 on weekends
    pub weekday: f64,
    /// Always 1.0
    pub constant: f64,
}

impl FeatureRow {
    /// Row values in design matrix column order
    pub fn to_vec(&self) -> Vec<f64> {
        let mut values = self.powers.clone();
        values.push(self.weekday);
        values.push(self.constant);
        values
    }
}

/// Builds feature rows and design matrices for a fixed polynomial degree
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    degree: PolynomialDegree,
}

impl FeatureBuilder {
    pub fn new(degree: PolynomialDegree) -> Self {
        Self { degree }
    }

    pub fn degree(&self) -> PolynomialDegree {
        self.degree
    }

    /// Number of design matrix columns (d powers + weekday + constant)
    pub fn n_columns(&self) -> usize {
        self.degree.get() + 2
    }

    /// Column names, matching the persisted coefficient keys
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = (1..=self.degree.get()).map(term_key).collect();
        names.push(WEEKDAY_KEY.to_string());
        names.push(CONSTANT_KEY.to_string());
        names
    }

    pub fn row(&self, temperature: f64, date: NaiveDate) -> FeatureRow {
        FeatureRow {
            powers: temperature_powers(temperature, self.degree.get()),
            weekday: if is_weekday(date) { 1.0 } else { 0.0 },
            constant: 1.0,
        }
    }

    /// Design matrix with one row per (temperature, date) pair
    pub fn design_matrix(&self, temperatures: &[f64], dates: &[NaiveDate]) -> Result<DMatrix<f64>> {
        if temperatures.len() != dates.len() {
            return Err(AnalysisError::Shape {
                temperatures: temperatures.len(),
                dates: dates.len(),
            });
        }

        let n_cols = self.n_columns();
        let mut data = Vec::with_capacity(temperatures.len() * n_cols);
        for (t, d) in temperatures.iter().zip(dates.iter()) {
            data.extend(self.row(*t, *d).to_vec());
        }

        Ok(DMatrix::from_row_slice(temperatures.len(), n_cols, &data))
    }
}

/// `[t, t^2, .., t^degree]`
pub fn temperature_powers(temperature: f64, degree: usize) -> Vec<f64> {
    (1..=degree as i32).map(|k| temperature.powi(k)).collect()
}
