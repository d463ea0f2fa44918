//! Price curves and hourly price/demand exports

use csv::StringRecord;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{find_column, line_of, open_csv, parse_date, parse_number, PREAMBLE_LINES};
use crate::domain::{HourlySeries, PriceCurveSet};
use crate::error::{AnalysisError, Result};

pub const LOCAL_DATE_COLUMN: &str = "Local Date";
pub const HOUR_COLUMN: &str = "Hour Number";

/// Load the region → piecewise-linear price curve artifact
pub fn load_price_curves(path: &Path) -> Result<PriceCurveSet> {
    if !path.exists() {
        return Err(AnalysisError::missing_file("price curves", path));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn exact_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AnalysisError::MissingColumn {
            pattern: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn parse_hour(cell: &str, path: &Path, line: usize) -> Result<Option<u32>> {
    Ok(parse_number(cell, path, line)?
        .filter(|h| *h >= 0.0)
        .map(|h| h as u32))
}

/// Read an hourly price export; every column after the hour column is a
/// price and the row's price is their mean.
pub fn read_hourly_prices(path: &Path) -> Result<HourlySeries> {
    let mut reader = open_csv(path, "price data", PREAMBLE_LINES)?;
    let headers = reader.headers()?.clone();
    let date_col = exact_column(&headers, LOCAL_DATE_COLUMN, path)?;
    let hour_col = exact_column(&headers, HOUR_COLUMN, path)?;
    let price_cols: Vec<usize> = (hour_col + 1..headers.len()).collect();

    let mut series = HourlySeries::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record, PREAMBLE_LINES);
        let (Some(date), Some(hour)) = (record.get(date_col), record.get(hour_col)) else {
            continue;
        };
        let date = parse_date(date, path, line)?;
        let Some(hour) = parse_hour(hour, path, line)? else {
            continue;
        };

        let mut prices = Vec::with_capacity(price_cols.len());
        for &col in &price_cols {
            if let Some(p) = parse_number(record.get(col).unwrap_or(""), path, line)? {
                prices.push(p);
            }
        }
        if !prices.is_empty() {
            series.insert((date, hour), prices.iter().sum::<f64>() / prices.len() as f64);
        }
    }
    Ok(series)
}

/// Read an hourly demand export's total column (MW)
pub fn read_hourly_demand(path: &Path) -> Result<HourlySeries> {
    let mut reader = open_csv(path, "demand data", PREAMBLE_LINES)?;
    let headers = reader.headers()?.clone();
    let date_col = exact_column(&headers, LOCAL_DATE_COLUMN, path)?;
    let hour_col = exact_column(&headers, HOUR_COLUMN, path)?;
    let total_col = find_column(&headers, super::TOTAL_COLUMN_PATTERN, path)?;

    let mut series = HourlySeries::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record, PREAMBLE_LINES);
        let (Some(date), Some(hour), Some(value)) = (
            record.get(date_col),
            record.get(hour_col),
            record.get(total_col),
        ) else {
            continue;
        };
        let date = parse_date(date, path, line)?;
        let (Some(hour), Some(mw)) = (parse_hour(hour, path, line)?, parse_number(value, path, line)?)
        else {
            continue;
        };
        series.insert((date, hour), mw);
    }
    Ok(series)
}
