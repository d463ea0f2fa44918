mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use grid_climate_demand::{config::Config, domain::PolynomialDegree, pipeline, telemetry};
use tracing::{info, warn};

use cli::{Cli, Commands, RunArgs};

fn resolve(cfg: &Config, args: RunArgs) -> Result<(i32, PolynomialDegree)> {
    let year = args.year.unwrap_or(cfg.analysis.fit_year);
    let degree = match args.degree {
        Some(d) => PolynomialDegree::new(d)?,
        None => cfg.degree()?,
    };
    Ok((year, degree))
}

fn report_summary<T>(run: &pipeline::Run<T>) {
    let summary = &run.summary;
    info!(
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        "run summary"
    );
    for error in &summary.errors {
        warn!("{error}");
    }
    for path in &run.outputs {
        info!(path = %path.display(), "wrote output");
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    telemetry::init_tracing(cli.json_logs || cfg.telemetry.json_logs);

    match cli.command {
        Commands::Fit(args) => {
            let (year, degree) = resolve(&cfg, args)?;
            info!(year, %degree, regions = cfg.regions.len(), "fitting regions");
            let run = pipeline::fit_regions(&cfg, year, degree).context("fit failed")?;
            report_summary(&run);
        }
        Commands::Impact(args) => {
            let (year, degree) = resolve(&cfg, args)?;
            info!(
                year,
                %degree,
                baseline = %cfg.periods.baseline,
                recent = %cfg.periods.recent,
                "analyzing demand change"
            );
            let run = pipeline::analyze_demand_change(&cfg, year, degree)
                .context("demand change analysis failed")?;
            report_summary(&run);
        }
        Commands::Cost(args) => {
            let (year, degree) = resolve(&cfg, args)?;
            info!(year, %degree, months = ?cfg.cost.months, "estimating cost change");
            let run = pipeline::estimate_costs(&cfg, year, degree)
                .context("cost estimation failed")?;
            report_summary(&run);
        }
        Commands::PreparePrices { year } => {
            let year = year.unwrap_or(cfg.analysis.fit_year);
            info!(year, "preparing daily prices");
            let run = pipeline::prepare_prices(&cfg, year).context("price preparation failed")?;
            report_summary(&run);
        }
    }

    Ok(())
}
