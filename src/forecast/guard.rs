//! Temperature range guard
//!
//! Keeps prediction inputs inside the range a fit was trained on. The cold
//! side is held at the fit's observed minimum; the warm side may be relaxed
//! to a fixed ceiling so recent warm extremes are extrapolated.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{FitResult, RegionId};

/// Default warm-side ceiling (°C)
pub const DEFAULT_WARM_CEILING_C: f64 = 50.0;

/// Clipped temperatures and how many values moved on each side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipOutcome {
    pub values: Vec<f64>,
    pub below: usize,
    pub above: usize,
}

impl ClipOutcome {
    pub fn clipped(&self) -> usize {
        self.below + self.above
    }
}

/// Clamps temperatures into `[floor, ceiling]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureGuard {
    pub floor: f64,
    pub ceiling: f64,
}

impl TemperatureGuard {
    /// The ceiling is raised to the floor if it would sit below it
    pub fn new(floor: f64, ceiling: f64) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
        }
    }

    /// Guard for a fit: floor at the observed minimum, ceiling at
    /// `warm_ceiling_c` or, when none is given, the observed maximum.
    pub fn for_fit(fit: &FitResult, warm_ceiling_c: Option<f64>) -> Self {
        let range = &fit.data_range;
        Self::new(
            range.min_temp_c,
            warm_ceiling_c.unwrap_or(range.max_temp_c),
        )
    }

    pub fn clamp(&self, temperature: f64) -> f64 {
        temperature.clamp(self.floor, self.ceiling)
    }

    /// Clip every value; never fails, logs a warning per side that moved
    pub fn clip(&self, region: &RegionId, temperatures: &[f64]) -> ClipOutcome {
        let mut below = 0;
        let mut above = 0;
        let values = temperatures
            .iter()
            .map(|&t| {
                if t < self.floor {
                    below += 1;
                    self.floor
                } else if t > self.ceiling {
                    above += 1;
                    self.ceiling
                } else {
                    t
                }
            })
            .collect();

        if below > 0 {
            warn!(
                region = %region,
                count = below,
                min_temp_c = format!("{:.2}", self.floor),
                "temperature values below minimum fit temperature, clipping to minimum"
            );
        }
        if above > 0 {
            warn!(
                region = %region,
                count = above,
                max_temp_c = format!("{:.2}", self.ceiling),
                "temperature values above maximum fit temperature, clipping to maximum"
            );
        }

        ClipOutcome {
            values,
            below,
            above,
        }
    }
}
