//! Batch operations behind the CLI subcommands
//!
//! Each operation walks the configured regions, isolates per-region
//! failures, and writes its artifacts.

use std::path::PathBuf;
use tracing::info;

use crate::analysis::{run_regions, BatchSummary, CostEstimator, PeriodAggregator, Window};
use crate::config::{Config, RegionConfig};
use crate::domain::{
    daily_weighted_prices, ChangeReport, CostReport, DailyPriceDemand, FitCollection, FitMetadata,
    FitResult, PolynomialDegree, RegionSeries,
};
use crate::error::{AnalysisError, Result};
use crate::forecast::{CurveFitter, DemandModel, FitConfig, TemperatureGuard};
use crate::repo::{
    cost_file_name, daily_price_demand_file_name, fits_path, load_fits, load_price_curves,
    read_demand, read_hourly_demand, read_hourly_prices, read_temperature, save_fits,
    write_cost_table, write_daily_price_demand, write_impact_outputs, write_json, CostDocument,
    CostMetadata, ImpactDocument, ImpactMetadata,
};

/// Results of one batch operation and the files it wrote
#[derive(Debug, Clone)]
pub struct Run<T> {
    pub results: Vec<T>,
    pub summary: BatchSummary,
    pub outputs: Vec<PathBuf>,
}

/// Fit every configured region's demand export for `year`
pub fn fit_regions(config: &Config, year: i32, degree: PolynomialDegree) -> Result<Run<FitResult>> {
    let fitter = CurveFitter::new(FitConfig {
        degree,
        min_valid_days: config.analysis.min_valid_days,
    });

    let outcome = run_regions(&config.regions, |region| {
        let demand = read_demand(&region.demand_path(&config.paths, year))?;
        let temperature = read_temperature(&region.temperature_path(&config.paths, year))?;
        let series = RegionSeries::new(region.region_id(), temperature, demand);
        fitter.fit(&series, &region.filter())
    })
    .into_result()?;

    let summary = outcome.summary;
    let collection = FitCollection {
        fits: outcome.results,
        errors: summary.errors.clone(),
        metadata: FitMetadata {
            max_degree: Some(degree.get()),
            year: Some(year),
            n_zones_total: summary.total,
            n_zones_successful: summary.successful,
            n_zones_failed: summary.failed,
        },
    };

    let path = fits_path(&config.paths.output_dir, year, degree);
    save_fits(&path, &collection)?;
    info!(path = %path.display(), fits = collection.fits.len(), "saved polynomial fits");

    Ok(Run {
        results: collection.fits,
        summary,
        outputs: vec![path],
    })
}

fn model_for(
    config: &Config,
    fits: &FitCollection,
    region: &RegionConfig,
    degree: PolynomialDegree,
) -> Result<(DemandModel, TemperatureGuard)> {
    let fit = fits.find(&region.region_id())?;
    let model = DemandModel::from_fit(fit, degree)?;
    let guard = TemperatureGuard::for_fit(fit, config.warm_ceiling(region));
    Ok((model, guard))
}

/// Compare predicted demand between the baseline and recent periods
pub fn analyze_demand_change(
    config: &Config,
    year: i32,
    degree: PolynomialDegree,
) -> Result<Run<ChangeReport>> {
    let fits = load_fits(&fits_path(&config.paths.output_dir, year, degree))?;
    let (baseline, recent) = (config.periods.baseline, config.periods.recent);

    let outcome = run_regions(&config.regions, |region| {
        let (model, guard) = model_for(config, &fits, region, degree)?;
        let temperatures = read_temperature(&region.temperature_path(&config.paths, year))?;
        let report = PeriodAggregator::new(&model, guard).compare(
            Window::new(&temperatures, baseline),
            Window::new(&temperatures, recent),
        )?;

        info!(
            region = %region,
            annual_change_gw = ?report.absolute_change.annual,
            annual_change_pct = ?report.percent_change.annual,
            "demand change"
        );
        Ok(report)
    })
    .into_result()?;

    let document = ImpactDocument::new(
        &outcome.results,
        ImpactMetadata {
            year,
            degree,
            baseline_period: baseline,
            recent_period: recent,
            warm_ceiling_c: config.analysis.warm_ceiling_c,
        },
        outcome.summary.clone(),
    );

    let dir = config.paths.impact_dir();
    write_impact_outputs(&dir, year, degree, &outcome.results, &document)?;
    info!(dir = %dir.display(), "saved demand change results");

    Ok(Run {
        results: outcome.results,
        summary: outcome.summary,
        outputs: vec![dir],
    })
}

/// Mean annual wholesale cost in each period for the configured months
pub fn estimate_costs(
    config: &Config,
    year: i32,
    degree: PolynomialDegree,
) -> Result<Run<CostReport>> {
    let fits = load_fits(&fits_path(&config.paths.output_dir, year, degree))?;
    let curves = load_price_curves(&config.paths.price_curves_path(year))?;
    let (baseline, recent) = (config.periods.baseline, config.periods.recent);

    let outcome = run_regions(&config.regions, |region| {
        let (model, guard) = model_for(config, &fits, region, degree)?;
        let curve = curves.find(&region.region_id())?;
        let temperatures = read_temperature(&region.temperature_path(&config.paths, year))?;
        let report = CostEstimator::new(&model, guard, curve, &config.cost.months)
            .estimate(&temperatures, baseline, recent)?;

        info!(
            region = %region,
            baseline_busd = report.baseline_usd / 1e9,
            recent_busd = report.recent_usd / 1e9,
            "cost change"
        );
        Ok(report)
    })
    .into_result()?;

    let dir = &config.paths.output_dir;
    let csv_path = dir.join(cost_file_name(year, degree, "csv"));
    let json_path = dir.join(cost_file_name(year, degree, "json"));
    write_cost_table(&csv_path, &outcome.results)?;
    write_json(
        &json_path,
        &CostDocument {
            results: outcome.results.clone(),
            metadata: CostMetadata {
                year,
                degree,
                baseline_period: baseline,
                recent_period: recent,
                months: config.cost.months.clone(),
            },
            summary: outcome.summary.clone(),
        },
    )?;

    Ok(Run {
        results: outcome.results,
        summary: outcome.summary,
        outputs: vec![csv_path, json_path],
    })
}

/// Daily demand-weighted prices from the hourly price and demand exports
pub fn prepare_prices(config: &Config, year: i32) -> Result<Run<DailyPriceDemand>> {
    let outcome = run_regions(&config.regions, |region| {
        let price_path = region.price_path(&config.paths, year).ok_or_else(|| {
            AnalysisError::MissingArtifact {
                kind: "price data",
                target: format!("no price file configured for region {region}"),
            }
        })?;
        let prices = read_hourly_prices(&price_path)?;
        let demand = read_hourly_demand(&region.demand_path(&config.paths, year))?;

        let days = daily_weighted_prices(&region.region_id(), &prices, &demand);
        if days.is_empty() {
            return Err(AnalysisError::NoData {
                start_year: year,
                end_year: year,
            });
        }
        info!(region = %region, days = days.len(), "processed daily prices");
        Ok(days)
    })
    .into_result()?;

    let rows: Vec<DailyPriceDemand> = outcome.results.into_iter().flatten().collect();
    let path = config
        .paths
        .output_dir
        .join(daily_price_demand_file_name(year));
    write_daily_price_demand(&path, &rows)?;
    info!(path = %path.display(), records = rows.len(), "saved daily price and demand data");

    Ok(Run {
        results: rows,
        summary: outcome.summary,
        outputs: vec![path],
    })
}
