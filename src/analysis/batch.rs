//! Per-region batch runner
//!
//! Runs one operation per configured region, records failures as
//! `"<region>: <message>"` and keeps going.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{error, info};

use crate::error::{AnalysisError, Result};

/// Counts and failure messages for a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    pub summary: BatchSummary,
}

impl<T> BatchOutcome<T> {
    /// Hard failure when no region succeeded
    pub fn into_result(self) -> Result<Self> {
        if self.results.is_empty() {
            return Err(AnalysisError::AllRegionsFailed {
                total: self.summary.total,
                errors: self.summary.errors,
            });
        }
        Ok(self)
    }
}

/// Run `op` for each region in order, collecting results and failures.
///
/// Regions are labelled in logs and error messages by their `Display` form.
pub fn run_regions<R, T, F>(regions: R, mut op: F) -> BatchOutcome<T>
where
    R: IntoIterator,
    R::Item: Display,
    F: FnMut(&R::Item) -> Result<T>,
{
    let mut results = Vec::new();
    let mut summary = BatchSummary::default();

    for region in regions {
        summary.total += 1;
        info!(region = %region, "processing region");

        match op(&region) {
            Ok(result) => {
                results.push(result);
                summary.successful += 1;
            }
            Err(e) => {
                error!(region = %region, kind = e.kind(), error = %e, "region failed");
                summary.errors.push(format!("{region}: {e}"));
                summary.failed += 1;
            }
        }
    }

    info!(
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        "batch complete"
    );

    BatchOutcome { results, summary }
}
