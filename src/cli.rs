//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::cache_adapter::{CachedDataAdapter, DEFAULT_CACHE_TTL};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::AnalysisConfig;
use crate::domain::config_validation::{parse_date, parse_horizons, validate_analysis_config};
use crate::domain::error::PairfolioError;
use crate::domain::moving_average::{is_above_ma, moving_average};
use crate::domain::price::PriceSeries;
use crate::domain::sweep::{
    CurveReport, SweepReport, TrendReport, period_key, run_fixed_curve, run_fixed_sweep,
    run_trend_by_horizon,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_REPORT_PATH: &str = "report.json";

#[derive(Parser, Debug)]
#[command(name = "pairfolio", about = "Two-asset portfolio simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweep fixed asset-1 weights across all horizons
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the trend-following strategy for each horizon
    Trend {
        #[arg(short, long)]
        config: PathBuf,
        /// Asset-1 weight while above the moving average
        #[arg(long)]
        above: Option<f64>,
        /// Asset-1 weight while below the moving average
        #[arg(long)]
        below: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the day-by-day equity curve for one fixed weight
    Curve {
        #[arg(short, long)]
        config: PathBuf,
        /// Asset-1 weight in percent
        #[arg(short, long)]
        weight: u32,
        /// Horizon in years (defaults to the first configured horizon)
        #[arg(long)]
        years: Option<u32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the current moving-average state of the trend asset
    Ma {
        #[arg(short, long)]
        config: PathBuf,
        /// Symbol to inspect instead of asset1
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate an analysis configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep { config, output } => run_sweep(&config, output.as_deref()),
        Command::Trend {
            config,
            above,
            below,
            output,
        } => run_trend(&config, above, below, output.as_deref()),
        Command::Curve {
            config,
            weight,
            years,
            output,
        } => run_curve(&config, weight, years, output.as_deref()),
        Command::Ma { config, symbol } => run_ma(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: PairfolioError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(PairfolioError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Loads and validates the config file in one step.
fn load_validated(path: &Path) -> Result<(FileConfigAdapter, AnalysisConfig), ExitCode> {
    info!("loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_analysis_config(&adapter).map_err(fail)?;
    let config = build_analysis_config(&adapter).map_err(fail)?;
    Ok((adapter, config))
}

pub fn build_analysis_config(adapter: &dyn ConfigPort) -> Result<AnalysisConfig, PairfolioError> {
    let asset = |key: &str| {
        adapter
            .get_string("analysis", key)
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PairfolioError::ConfigMissing {
                section: "analysis".into(),
                key: key.into(),
            })
    };
    let mut config = AnalysisConfig::new(asset("asset1")?, asset("asset2")?);

    config.as_of = match adapter.get_string("analysis", "as_of") {
        Some(s) if !s.trim().is_empty() => Some(parse_date(&s, "analysis", "as_of")?),
        _ => None,
    };
    if let Some(horizons) = adapter.get_string("analysis", "horizons") {
        config.horizons = parse_horizons(&horizons)?;
    }
    config.weight_step = adapter.get_int("analysis", "weight_step", config.weight_step as i64) as u32;
    config.rebalance_threshold =
        adapter.get_double("analysis", "rebalance_threshold", config.rebalance_threshold);
    config.risk_free_rate = adapter.get_double("analysis", "risk_free_rate", config.risk_free_rate);

    config.ma_period = adapter.get_int("trend", "ma_period", config.ma_period as i64) as usize;
    config.above_weight = adapter.get_double("trend", "above_weight", config.above_weight);
    config.below_weight = adapter.get_double("trend", "below_weight", config.below_weight);
    config.cooldown_days = adapter.get_int("trend", "cooldown_days", config.cooldown_days);

    for symbol in adapter.keys("yield") {
        let value = adapter.get_double("yield", &symbol, 0.0);
        config.yields.insert(&symbol, value);
    }

    Ok(config)
}

pub fn build_data_port(
    adapter: &dyn ConfigPort,
) -> Result<CachedDataAdapter<CsvAdapter>, PairfolioError> {
    let directory = adapter
        .get_string("data", "directory")
        .ok_or_else(|| PairfolioError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })?;
    let ttl = adapter.get_int("data", "cache_ttl_secs", DEFAULT_CACHE_TTL.as_secs() as i64);
    let ttl = Duration::from_secs(ttl.max(0) as u64);
    Ok(CachedDataAdapter::new(
        CsvAdapter::new(PathBuf::from(directory.trim())),
        ttl,
    ))
}

pub fn load_pair(
    data_port: &dyn PriceDataPort,
    config: &AnalysisConfig,
) -> Result<(PriceSeries, PriceSeries), PairfolioError> {
    let series1 = data_port.fetch_series(&config.asset1)?;
    let series2 = data_port.fetch_series(&config.asset2)?;
    info!(
        "{}: {} points, {}: {} points",
        series1.symbol,
        series1.len(),
        series2.symbol,
        series2.len()
    );
    Ok((series1, series2))
}

fn report_path(adapter: &dyn ConfigPort, output: Option<&Path>) -> PathBuf {
    output.map(Path::to_path_buf).unwrap_or_else(|| {
        adapter
            .get_string("report", "output")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH))
    })
}

fn run_sweep(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let (series1, series2) = match load_pair(&data_port, &config) {
        Ok(pair) => pair,
        Err(e) => return fail(e),
    };

    let report = match run_fixed_sweep(&series1, &series2, &config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    print_sweep_summary(&report, &config.horizons);

    if report.rows.iter().all(|r| r.periods.is_empty()) {
        warn!("no horizon produced results");
    }

    let path = report_path(&adapter, output);
    match JsonReportAdapter::new().write_sweep(&report, &path) {
        Ok(()) => {
            println!("\nReport written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_sweep_summary(report: &SweepReport, horizons: &[u32]) {
    println!(
        "=== Fixed-weight sweep: {} / {} (as of {}) ===",
        report.asset1, report.asset2, report.as_of
    );
    for &years in horizons {
        match report.best_sharpe(years) {
            Some((row, stats)) => println!(
                "{:>8}  best Sharpe {:.2} at {}/{}  CAGR {:.2}%  Vol {:.2}%  MDD -{:.1}%",
                period_key(years),
                stats.sharpe_ratio,
                row.weight1,
                row.weight2,
                stats.annual_return * 100.0,
                stats.volatility * 100.0,
                stats.mdd * 100.0,
            ),
            None => println!("{:>8}  no data", period_key(years)),
        }
    }
    if !report.failures.is_empty() {
        println!("{} cells skipped", report.failures.len());
    }
}

fn run_trend(
    config_path: &Path,
    above: Option<f64>,
    below: Option<f64>,
    output: Option<&Path>,
) -> ExitCode {
    let (adapter, mut config) = match load_validated(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Some(w) = above {
        config.above_weight = w;
    }
    if let Some(w) = below {
        config.below_weight = w;
    }
    for weight in [config.above_weight, config.below_weight] {
        if !(0.0..=100.0).contains(&weight) {
            return fail(PairfolioError::InvalidWeight { weight });
        }
    }

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let (series1, series2) = match load_pair(&data_port, &config) {
        Ok(pair) => pair,
        Err(e) => return fail(e),
    };

    let report = match run_trend_by_horizon(&series1, &series2, &config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    print_trend_summary(&report);

    let path = report_path(&adapter, output);
    match JsonReportAdapter::new().write_trend(&report, &path) {
        Ok(()) => {
            println!("\nReport written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_trend_summary(report: &TrendReport) {
    println!(
        "=== Trend following: {} {}/{} above, {}/{} below {}-day MA (as of {}) ===",
        report.asset1,
        report.above_weight,
        100.0 - report.above_weight,
        report.below_weight,
        100.0 - report.below_weight,
        report.ma_period,
        report.as_of
    );
    println!(
        "Currently {} the moving average",
        if report.is_above_ma { "above" } else { "below" }
    );
    for cell in &report.cells {
        println!(
            "{:>8}  CAGR {:.2}%  Vol {:.2}%  Sharpe {:.2}  MDD -{:.1}%  switches {}/{}",
            period_key(cell.years),
            cell.stats.annual_return * 100.0,
            cell.stats.volatility * 100.0,
            cell.stats.sharpe_ratio,
            cell.stats.mdd * 100.0,
            cell.summary.limited_crossovers,
            cell.summary.total_crossovers,
        );
    }
    for failure in &report.failures {
        println!("{:>8}  skipped: {}", period_key(failure.years), failure.reason);
    }
}

fn run_curve(config_path: &Path, weight: u32, years: Option<u32>, output: Option<&Path>) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if weight > 100 {
        return fail(PairfolioError::InvalidWeight {
            weight: weight as f64,
        });
    }
    let Some(years) = years.or_else(|| config.horizons.first().copied()) else {
        return fail(PairfolioError::ConfigMissing {
            section: "analysis".into(),
            key: "horizons".into(),
        });
    };

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let (series1, series2) = match load_pair(&data_port, &config) {
        Ok(pair) => pair,
        Err(e) => return fail(e),
    };

    let report = match run_fixed_curve(&series1, &series2, &config, weight, years) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    print_curve_summary(&report);

    let path = report_path(&adapter, output);
    match JsonReportAdapter::new().write_curve(&report, &path) {
        Ok(()) => {
            println!("\nReport written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_curve_summary(report: &CurveReport) {
    println!(
        "=== Fixed weight {}/{}: {} / {} over {} (as of {}) ===",
        report.weight1,
        report.weight2,
        report.asset1,
        report.asset2,
        period_key(report.years),
        report.as_of
    );
    let portfolio = report.curve.last().map_or(0.0, |p| p.value);
    let baseline = report.asset1_normalized.last().map_or(0.0, |p| p.value);
    println!(
        "{} days  end {:.2} (asset1 alone {:.2})  CAGR {:.2}%  Vol {:.2}%  Sharpe {:.2}  MDD -{:.1}%  rebalances {}",
        report.curve.len(),
        portfolio,
        baseline,
        report.stats.annual_return * 100.0,
        report.stats.volatility * 100.0,
        report.stats.sharpe_ratio,
        report.stats.mdd * 100.0,
        report.rebalances,
    );
}

fn run_ma(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let symbol = symbol.map(str::to_uppercase).unwrap_or(config.asset1);
    let series = match data_port.fetch_series(&symbol) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let ma = moving_average(&series, config.ma_period);
    let Some(latest) = ma.latest() else {
        return fail(PairfolioError::InsufficientData {
            have: series.len(),
            need: config.ma_period,
        });
    };

    println!("{} {}-day moving average", series.symbol, config.ma_period);
    println!("  isAboveMA: {}", is_above_ma(&ma));
    println!("  date:      {}", latest.date);
    println!("  price:     {:.2}", latest.price);
    println!("  ma:        {:.2}", latest.ma);
    println!("\nCrossovers ({}):", ma.crossovers.len());
    for c in &ma.crossovers {
        println!("  {}  {:<4}  price {:.2}  ma {:.2}", c.date, c.cross_type, c.price, c.ma);
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (adapter, config) = match load_validated(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    println!("Assets:      {} / {}", config.asset1, config.asset2);
    match config.as_of {
        Some(d) => println!("As of:       {d}"),
        None => println!("As of:       last date of {}", config.asset1),
    }
    let horizons: Vec<String> = config.horizons.iter().map(|&y| period_key(y)).collect();
    println!("Horizons:    {}", horizons.join(", "));
    println!("Weights:     {} steps", config.weight_grid().len());
    println!("Threshold:   {}", config.rebalance_threshold);
    println!("Risk-free:   {}", config.risk_free_rate);
    println!(
        "Trend:       {}-day MA, {} above / {} below, cooldown {} days",
        config.ma_period, config.above_weight, config.below_weight, config.cooldown_days
    );
    for symbol in adapter.keys("yield") {
        println!("Yield:       {} {}", symbol.to_uppercase(), config.yields.get(&symbol));
    }

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    match data_port.list_symbols() {
        Ok(symbols) => {
            for asset in [&config.asset1, &config.asset2] {
                if !symbols.iter().any(|s| s.eq_ignore_ascii_case(asset)) {
                    warn!("no CSV file for {asset} in the data directory");
                }
            }
        }
        Err(e) => warn!("{e}"),
    }

    println!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
