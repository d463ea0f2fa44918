use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::write_json;
use crate::domain::{FitCollection, PolynomialDegree};
use crate::error::{AnalysisError, Result};

/// `polynomial_fits_RTO_{year}_degree{d}.json`
pub fn fits_file_name(year: i32, degree: PolynomialDegree) -> String {
    format!("polynomial_fits_RTO_{year}_degree{degree}.json")
}

pub fn fits_path(output_dir: &Path, year: i32, degree: PolynomialDegree) -> PathBuf {
    output_dir.join(fits_file_name(year, degree))
}

/// Load a persisted fit collection
pub fn load_fits(path: &Path) -> Result<FitCollection> {
    if !path.exists() {
        return Err(AnalysisError::missing_file("polynomial fits", path));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_fits(path: &Path, fits: &FitCollection) -> Result<()> {
    write_json(path, fits)
}
