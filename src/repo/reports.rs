//! CSV and JSON report writers

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{ensure_parent, write_json};
use crate::analysis::BatchSummary;
use crate::domain::{
    ChangeReport, CostReport, DailyPriceDemand, MonthlyProfile, PolynomialDegree, YearRange,
    MONTH_NAMES,
};
use crate::error::Result;

/// Region tables written by the demand-change analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ChangeTable {
    #[strum(serialize = "changes_absolute")]
    Absolute,
    #[strum(serialize = "changes_percent")]
    Percent,
    Baseline,
    Current,
}

impl ChangeTable {
    /// `rto_demand_{table}_{year}_degree{d}.csv`
    pub fn file_name(self, year: i32, degree: PolynomialDegree) -> String {
        format!("rto_demand_{self}_{year}_degree{degree}.csv")
    }

    fn profile(self, report: &ChangeReport) -> &MonthlyProfile {
        match self {
            Self::Absolute => &report.absolute_change,
            Self::Percent => &report.percent_change,
            Self::Baseline => &report.baseline,
            Self::Current => &report.recent,
        }
    }

    fn decimals(self) -> Option<i32> {
        match self {
            Self::Percent => Some(1),
            _ => None,
        }
    }
}

pub fn impact_file_name(year: i32, degree: PolynomialDegree) -> String {
    format!("rto_climate_change_impact_results_{year}_degree{degree}.json")
}

pub fn cost_file_name(year: i32, degree: PolynomialDegree, extension: &str) -> String {
    format!("rto_cost_changes_{year}_degree{degree}.{extension}")
}

pub fn daily_price_demand_file_name(year: i32) -> String {
    format!("daily_price_demand_{year}.csv")
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-decimals);
        (value / factor).round() * factor
    }
}

/// Round to `digits` significant figures
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    round_to(value, digits - 1 - magnitude)
}

fn cell(value: Option<f64>, decimals: Option<i32>) -> String {
    match (value, decimals) {
        (Some(v), Some(d)) => round_to(v, d).to_string(),
        (Some(v), None) => v.to_string(),
        (None, _) => String::new(),
    }
}

/// Write one region-by-month table; undefined figures are empty cells
pub fn write_change_table(path: &Path, table: ChangeTable, reports: &[ChangeReport]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["RTO"];
    header.extend(MONTH_NAMES);
    header.push("Annual");
    wtr.write_record(&header)?;

    for report in reports {
        let mut row = vec![report.region.to_string()];
        row.extend(
            table
                .profile(report)
                .columns()
                .map(|v| cell(v, table.decimals())),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Per-region figures in the impact document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionImpact {
    pub baseline: MonthlyProfile,
    pub recent: MonthlyProfile,
    pub absolute_change: MonthlyProfile,
    pub percent_change: MonthlyProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactMetadata {
    pub year: i32,
    pub degree: PolynomialDegree,
    pub baseline_period: YearRange,
    pub recent_period: YearRange,
    pub warm_ceiling_c: Option<f64>,
}

/// JSON summary of a demand-change run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactDocument {
    pub results: BTreeMap<String, RegionImpact>,
    pub months: Vec<String>,
    pub metadata: ImpactMetadata,
    pub summary: BatchSummary,
}

impl ImpactDocument {
    pub fn new(reports: &[ChangeReport], metadata: ImpactMetadata, summary: BatchSummary) -> Self {
        let results = reports
            .iter()
            .map(|r| {
                (
                    r.region.to_string(),
                    RegionImpact {
                        baseline: r.baseline,
                        recent: r.recent,
                        absolute_change: r.absolute_change,
                        percent_change: r.percent_change,
                    },
                )
            })
            .collect();

        Self {
            results,
            months: MONTH_NAMES.iter().map(|m| m.to_string()).collect(),
            metadata,
            summary,
        }
    }
}

/// Write the four change tables and the impact document into `dir`
pub fn write_impact_outputs(
    dir: &Path,
    year: i32,
    degree: PolynomialDegree,
    reports: &[ChangeReport],
    document: &ImpactDocument,
) -> Result<()> {
    use strum::IntoEnumIterator;

    for table in ChangeTable::iter() {
        write_change_table(&dir.join(table.file_name(year, degree)), table, reports)?;
    }
    write_json(&dir.join(impact_file_name(year, degree)), document)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMetadata {
    pub year: i32,
    pub degree: PolynomialDegree,
    pub baseline_period: YearRange,
    pub recent_period: YearRange,
    pub months: Vec<u32>,
}

/// JSON summary of a cost run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDocument {
    pub results: Vec<CostReport>,
    pub metadata: CostMetadata,
    pub summary: BatchSummary,
}

#[derive(Debug, Serialize)]
struct CostRow<'a> {
    #[serde(rename = "RTO")]
    region: &'a str,
    baseline_cost_usd: f64,
    recent_cost_usd: f64,
    change_usd: f64,
    percent_change: Option<f64>,
    baseline_years: usize,
    recent_years: usize,
}

pub fn write_cost_table(path: &Path, reports: &[CostReport]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for r in reports {
        wtr.serialize(CostRow {
            region: r.region.as_str(),
            baseline_cost_usd: r.baseline_usd,
            recent_cost_usd: r.recent_usd,
            change_usd: r.change_usd,
            percent_change: r.percent_change.map(|p| round_to(p, 2)),
            baseline_years: r.baseline_years,
            recent_years: r.recent_years,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct DailyPriceDemandRow<'a> {
    #[serde(rename = "Local Date")]
    date: String,
    #[serde(rename = "Total Demand")]
    demand_gw: f64,
    #[serde(rename = "Demand-Weighted Avg Price")]
    weighted_price: f64,
    #[serde(rename = "RTO")]
    region: &'a str,
}

/// Daily price/demand table, figures at four significant digits
pub fn write_daily_price_demand(path: &Path, rows: &[DailyPriceDemand]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for r in rows {
        wtr.serialize(DailyPriceDemandRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            demand_gw: round_significant(r.demand_gw, 4),
            weighted_price: round_significant(r.weighted_price, 4),
            region: r.region.as_str(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
