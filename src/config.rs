use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::domain::{PolynomialDegree, RegionId, YearRange};
use crate::forecast::{DemandFilter, DEFAULT_WARM_CEILING_C, MIN_VALID_DAYS};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "GCD__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub periods: PeriodsConfig,
    pub cost: CostConfig,
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
    pub regions: Vec<RegionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    #[validate(range(min = 1, max = 4))]
    pub degree: usize,
    /// Year of the demand data used for fitting
    #[validate(range(min = 1900, max = 2200))]
    pub fit_year: i32,
    #[validate(range(min = 1))]
    pub min_valid_days: usize,
    /// Warm-side clip ceiling (°C); unset clips at each fit's observed maximum
    pub warm_ceiling_c: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodsConfig {
    pub baseline: YearRange,
    pub recent: YearRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Calendar months (1-12) included in cost totals
    pub months: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub demand_dir: PathBuf,
    pub temperature_dir: PathBuf,
    pub price_dir: PathBuf,
    /// Price curve artifact; `{year}` is replaced with the analysis year
    pub price_curves: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub json_logs: bool,
}

/// One grid region: its input files and demand plausibility bounds.
///
/// File names may contain `{year}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegionConfig {
    #[validate(length(min = 1))]
    pub id: String,
    pub demand_file: String,
    pub temperature_file: String,
    #[serde(default)]
    pub price_file: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub min_demand_gw: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub max_demand_gw: Option<f64>,
    /// Overrides `analysis.warm_ceiling_c` for this region
    #[serde(default)]
    pub warm_ceiling_c: Option<f64>,
}

fn fill_year(template: &str, year: i32) -> String {
    template.replace("{year}", &year.to_string())
}

impl RegionConfig {
    fn rto(id: &str, long_name: &str) -> Self {
        let key = id.to_lowercase();
        Self {
            id: id.to_string(),
            demand_file: format!("{key}_load_act_hr_{{year}}.csv"),
            temperature_file: format!("{long_name}_weighted_temp.csv"),
            price_file: Some(format!("{key}_price_day_ahead_hr_{{year}}.csv")),
            min_demand_gw: None,
            max_demand_gw: None,
            warm_ceiling_c: None,
        }
    }

    /// The seven U.S. RTOs with their population-weighted temperature files
    pub fn default_rtos() -> Vec<Self> {
        vec![
            Self::rto("CAISO", "CALIFORNIA_INDEPENDENT_SYSTEM_OPERATOR"),
            Self {
                max_demand_gw: Some(80.0),
                ..Self::rto("ERCOT", "ELECTRIC_RELIABILITY_COUNCIL_OF_TEXAS,_INC.")
            },
            Self::rto("ISONE", "ISO_NEW_ENGLAND_INC."),
            Self::rto(
                "MISO",
                "MIDCONTINENT_INDEPENDENT_TRANSMISSION_SYSTEM_OPERATOR,_INC..",
            ),
            Self::rto("NYISO", "NEW_YORK_INDEPENDENT_SYSTEM_OPERATOR"),
            Self {
                min_demand_gw: Some(40.0),
                ..Self::rto("PJM", "PJM_INTERCONNECTION,_LLC")
            },
            Self::rto("SPP", "SOUTHWEST_POWER_POOL"),
        ]
    }

    pub fn region_id(&self) -> RegionId {
        RegionId::new(self.id.clone())
    }

    pub fn filter(&self) -> DemandFilter {
        DemandFilter {
            min_demand_gw: self.min_demand_gw,
            max_demand_gw: self.max_demand_gw,
        }
    }

    pub fn demand_path(&self, paths: &PathsConfig, year: i32) -> PathBuf {
        paths.demand_dir.join(fill_year(&self.demand_file, year))
    }

    pub fn temperature_path(&self, paths: &PathsConfig, year: i32) -> PathBuf {
        paths
            .temperature_dir
            .join(fill_year(&self.temperature_file, year))
    }

    pub fn price_path(&self, paths: &PathsConfig, year: i32) -> Option<PathBuf> {
        self.price_file
            .as_ref()
            .map(|f| paths.price_dir.join(fill_year(f, year)))
    }
}

impl fmt::Display for RegionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl PathsConfig {
    pub fn price_curves_path(&self, year: i32) -> PathBuf {
        PathBuf::from(fill_year(&self.price_curves, year))
    }

    /// Directory for the demand-change tables
    pub fn impact_dir(&self) -> PathBuf {
        self.output_dir.join("climate_change_results")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                degree: 4,
                fit_year: 2024,
                min_valid_days: MIN_VALID_DAYS,
                warm_ceiling_c: Some(DEFAULT_WARM_CEILING_C),
            },
            periods: PeriodsConfig {
                baseline: YearRange::new(1951, 1980),
                recent: YearRange::new(2015, 2024),
            },
            cost: CostConfig {
                months: vec![6, 7, 8, 9],
            },
            paths: PathsConfig {
                demand_dir: PathBuf::from("gridstatus_demand"),
                temperature_dir: PathBuf::from("weighted_temps"),
                price_dir: PathBuf::from("gridstatus_price"),
                price_curves: "price_demand_pwlf_{year}.json".to_string(),
                output_dir: PathBuf::from("."),
            },
            telemetry: TelemetryConfig::default(),
            regions: RegionConfig::default_rtos(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file at `path` (if present), then `GCD__*`
    /// environment variables (`GCD__ANALYSIS__DEGREE=2`).
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let config: Config = figment.extract()?;
        config.validate_all()?;
        Ok(config)
    }

    pub fn validate_all(&self) -> Result<()> {
        self.analysis.validate()?;
        for region in &self.regions {
            region.validate()?;
            if let (Some(min), Some(max)) = (region.min_demand_gw, region.max_demand_gw) {
                if min > max {
                    bail!("region {}: min_demand_gw {min} exceeds max_demand_gw {max}", region.id);
                }
            }
        }

        let (baseline, recent) = (self.periods.baseline, self.periods.recent);
        for (name, range) in [("baseline", baseline), ("recent", recent)] {
            if !range.is_valid() {
                bail!("{name} period {range} starts after it ends");
            }
        }
        if baseline.overlaps(&recent) {
            bail!("baseline period {baseline} overlaps recent period {recent}");
        }

        if self.cost.months.is_empty() {
            bail!("cost.months must name at least one month");
        }
        if let Some(m) = self.cost.months.iter().find(|m| !(1..=12).contains(*m)) {
            bail!("cost.months contains invalid month {m}");
        }
        Ok(())
    }

    pub fn degree(&self) -> Result<PolynomialDegree> {
        Ok(PolynomialDegree::new(self.analysis.degree)?)
    }

    /// Region ceiling, else the global one
    pub fn warm_ceiling(&self, region: &RegionConfig) -> Option<f64> {
        region.warm_ceiling_c.or(self.analysis.warm_ceiling_c)
    }

    pub fn region(&self, id: &RegionId) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.id == id.as_str())
    }
}
