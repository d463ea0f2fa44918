//! Region temperature series
//!
//! Population-weighted temperature per region, one row per day or per
//! sub-daily step. Values in Kelvin are detected and converted.

use std::path::Path;
use tracing::info;

use super::{line_of, open_csv, parse_date, parse_number};
use crate::domain::DailySeries;
use crate::error::Result;

/// Value column names, in order of preference
pub const TEMPERATURE_COLUMNS: [&str; 2] = ["t2m", "temperature_c"];

/// A series whose mean exceeds this is taken to be in Kelvin
pub const KELVIN_THRESHOLD: f64 = 100.0;

pub const KELVIN_OFFSET: f64 = 273.15;

/// Read a temperature series as daily means in °C
pub fn read_temperature(path: &Path) -> Result<DailySeries> {
    let mut reader = open_csv(path, "temperature data", 0)?;
    let headers = reader.headers()?.clone();
    let value_column = TEMPERATURE_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
        .unwrap_or(1);

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record, 0);
        let (Some(time), Some(value)) = (record.get(0), record.get(value_column)) else {
            continue;
        };
        let date = parse_date(time, path, line)?;
        if let Some(t) = parse_number(value, path, line)? {
            samples.push((date, t));
        }
    }

    Ok(to_celsius(DailySeries::from_samples(samples)))
}

/// Convert a Kelvin series to °C; Celsius series pass through
pub fn to_celsius(series: DailySeries) -> DailySeries {
    match series.mean() {
        Some(mean) if mean > KELVIN_THRESHOLD => {
            info!(mean, "converting temperature from Kelvin to Celsius");
            series.map_values(|k| k - KELVIN_OFFSET)
        }
        _ => series,
    }
}
