use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use grid_climate_demand::config::DEFAULT_CONFIG_PATH;

/// Climate-driven electricity demand and cost analysis for U.S. grid regions
#[derive(Parser)]
#[command(name = "grid-climate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Copy, Debug, Default)]
pub struct RunArgs {
    /// Polynomial degree of the temperature response (1-4)
    #[arg(short, long)]
    pub degree: Option<usize>,

    /// Year of the demand data the fits are built from
    #[arg(short, long)]
    pub year: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit temperature-demand curves for every configured region
    Fit(RunArgs),
    /// Compare predicted demand between the baseline and recent periods
    Impact(RunArgs),
    /// Compare wholesale cost between the baseline and recent periods
    Cost(RunArgs),
    /// Build daily demand-weighted prices from hourly exports
    PreparePrices {
        #[arg(short, long)]
        year: Option<i32>,
    },
}
