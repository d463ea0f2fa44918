//! Fit diagnostics
//!
//! Goodness-of-fit metrics for the demand regression: RMSE and R² are
//! persisted with every fit; the full set is logged when a fit completes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Accuracy metrics of fitted vs observed demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Root Mean Square Error (GW)
    pub rmse: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    /// Mean Absolute Error (GW)
    pub mae: f64,
    /// Largest absolute residual (GW)
    pub max_error: f64,
    /// Number of samples evaluated
    pub sample_count: usize,
}

impl FitMetrics {
    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(AnalysisError::Shape {
                temperatures: predicted.len(),
                dates: actual.len(),
            });
        }

        if actual.is_empty() {
            return Err(AnalysisError::InsufficientData {
                valid: 0,
                required: 1,
            });
        }

        let n = actual.len() as f64;
        let residuals: Vec<f64> = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| a - p)
            .collect();

        let ss_res: f64 = residuals.iter().map(|e| e * e).sum();
        let rmse = (ss_res / n).sqrt();
        let mae = residuals.iter().map(|e| e.abs()).sum::<f64>() / n;
        let max_error = residuals.iter().map(|e| e.abs()).fold(0.0f64, f64::max);

        let mean_actual = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

        // Constant targets: a perfect fit scores 1, anything else 0
        let r2 = if ss_tot > 1e-12 {
            1.0 - ss_res / ss_tot
        } else if ss_res < 1e-12 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            rmse,
            r2,
            mae,
            max_error,
            sample_count: actual.len(),
        })
    }
}

impl fmt::Display for FitMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE={:.2} GW, MAE={:.2} GW, max={:.2} GW, R²={:.3}, n={}",
            self.rmse, self.mae, self.max_error, self.r2, self.sample_count
        )
    }
}
