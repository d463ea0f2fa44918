//! File-backed inputs and outputs
//!
//! Readers for the demand and price exports, temperature series, fit
//! collections and price curves, plus the CSV/JSON report writers.

pub mod demand;
pub mod fits;
pub mod prices;
pub mod reports;
pub mod temperature;

pub use demand::*;
pub use fits::*;
pub use prices::*;
pub use reports::*;
pub use temperature::*;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Lines of provider boilerplate above the header in exported CSV files
pub const PREAMBLE_LINES: usize = 3;

/// Open a CSV file, skipping `preamble` lines before the header row
pub(crate) fn open_csv(
    path: &Path,
    kind: &'static str,
    preamble: usize,
) -> Result<csv::Reader<BufReader<File>>> {
    if !path.exists() {
        return Err(AnalysisError::missing_file(kind, path));
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut skipped = String::new();
    for _ in 0..preamble {
        reader.read_line(&mut skipped)?;
        skipped.clear();
    }

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader))
}

/// 1-based line number of a record in the original file
pub(crate) fn line_of(record: &StringRecord, preamble: usize) -> usize {
    record.position().map_or(0, |p| p.line() as usize) + preamble
}

/// Parse the calendar date at the start of a date or timestamp cell
pub(crate) fn parse_date(cell: &str, path: &Path, line: usize) -> Result<NaiveDate> {
    let head = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|e| AnalysisError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("invalid date '{cell}': {e}"),
    })
}

/// Parse a numeric cell; empty and NaN cells are missing values
pub(crate) fn parse_number(cell: &str, path: &Path, line: usize) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|e| AnalysisError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("invalid number '{cell}': {e}"),
        })
}

/// Index of the first header containing `pattern`, case-insensitive
pub(crate) fn find_column(headers: &StringRecord, pattern: &str, path: &Path) -> Result<usize> {
    let pattern = pattern.to_lowercase();
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(&pattern))
        .ok_or_else(|| AnalysisError::MissingColumn {
            pattern,
            path: path.to_path_buf(),
        })
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write `value` as pretty-printed JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
