//! Hourly demand exports
//!
//! Provider exports carry three preamble lines, a header, and one row per
//! hour. Column 1 holds the local timestamp; demand (MW) is the first column
//! with "total" in its name.

use std::path::Path;
use tracing::debug;

use super::{find_column, line_of, open_csv, parse_date, parse_number, PREAMBLE_LINES};
use crate::domain::DailySeries;
use crate::error::{AnalysisError, Result};

pub const TOTAL_COLUMN_PATTERN: &str = "total";

/// Column holding the local timestamp
const TIMESTAMP_COLUMN: usize = 1;

const MW_PER_GW: f64 = 1_000.0;

/// Read a demand export as daily mean demand (GW)
pub fn read_demand(path: &Path) -> Result<DailySeries> {
    let mut reader = open_csv(path, "demand data", PREAMBLE_LINES)?;
    let headers = reader.headers()?.clone();
    let total = find_column(&headers, TOTAL_COLUMN_PATTERN, path)?;
    if headers.len() <= TIMESTAMP_COLUMN {
        return Err(AnalysisError::MissingColumn {
            pattern: "timestamp".to_string(),
            path: path.to_path_buf(),
        });
    }

    debug!(
        path = %path.display(),
        column = &headers[total],
        "using demand column"
    );

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record, PREAMBLE_LINES);
        let (Some(timestamp), Some(value)) = (record.get(TIMESTAMP_COLUMN), record.get(total))
        else {
            continue;
        };
        if timestamp.is_empty() {
            continue;
        }

        let date = parse_date(timestamp, path, line)?;
        if let Some(mw) = parse_number(value, path, line)? {
            samples.push((date, mw / MW_PER_GW));
        }
    }

    Ok(DailySeries::from_samples(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    const EXPORT: &str = "\
Actual Load
Source: gridstatus
Units: MW
Interval Start,Local Timestamp,Local Date,Hour Number,PJM Total Actual Load (MW)
2024-01-01T05:00:00Z,2024-01-01 00:00:00,2024-01-01,1,80000
2024-01-01T06:00:00Z,2024-01-01 01:00:00,2024-01-01,2,90000
2024-01-02T05:00:00Z,2024-01-02 00:00:00,2024-01-02,1,
2024-01-02T06:00:00Z,2024-01-02 01:00:00,2024-01-02,2,100000
";

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_demand_daily_gw() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pjm_load_act_hr_2024.csv", EXPORT);

        let series = read_demand(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), Some(85.0));
        // Empty cell skipped
        assert_eq!(series.get(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()), Some(100.0));
    }

    #[test]
    fn test_missing_total_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "spp.csv",
            "a\nb\nc\nInterval,Local Timestamp,Load (MW)\nx,2024-01-01 00:00:00,5\n",
        );

        let err = read_demand(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumn { ref pattern, .. } if pattern == "total"));
    }

    #[test]
    fn test_bad_value_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "miso.csv",
            "a\nb\nc\nInterval,Local Timestamp,Total\nx,2024-01-01 00:00:00,oops\n",
        );

        let err = read_demand(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 5, .. }));
    }
}
