//! Weight x horizon grid orchestration.
//!
//! Every (weight, horizon) cell reads the shared immutable series and owns
//! its result, so cells run in parallel on the rayon pool. A failing cell is
//! recorded in `failures` and left out of its row; the rest of the grid is
//! unaffected.

use crate::domain::alignment::{AlignedPair, align};
use crate::domain::analysis::AnalysisConfig;
use crate::domain::error::PairfolioError;
use crate::domain::metrics::{PerformanceStats, compute_stats};
use crate::domain::moving_average::{is_above_ma, moving_average};
use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::simulation::{
    EquityCurve, EquityPoint, SwitchSummary, simulate_fixed_with_threshold, simulate_trend,
};
use chrono::{Months, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Horizons with fewer points than this in either series are skipped.
pub const MIN_HORIZON_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight1: Option<u32>,
    pub years: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRow {
    pub weight1: u32,
    pub weight2: u32,
    /// Keyed `"<years>year"`; failed horizons are absent.
    pub periods: BTreeMap<String, PerformanceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub asset1: String,
    pub asset2: String,
    pub as_of: NaiveDate,
    pub rows: Vec<SweepRow>,
    pub failures: Vec<CellFailure>,
}

impl SweepReport {
    /// Row with the highest Sharpe ratio for `years`, if any cell succeeded.
    pub fn best_sharpe(&self, years: u32) -> Option<(&SweepRow, &PerformanceStats)> {
        let key = period_key(years);
        self.rows
            .iter()
            .filter_map(|row| row.periods.get(&key).map(|stats| (row, stats)))
            .max_by(|a, b| a.1.sharpe_ratio.total_cmp(&b.1.sharpe_ratio))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendCell {
    pub years: u32,
    #[serde(flatten)]
    pub stats: PerformanceStats,
    #[serde(flatten)]
    pub summary: SwitchSummary,
    pub curve: Vec<EquityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub asset1: String,
    pub asset2: String,
    pub as_of: NaiveDate,
    pub above_weight: f64,
    pub below_weight: f64,
    pub ma_period: usize,
    #[serde(rename = "isAboveMA")]
    pub is_above_ma: bool,
    pub cells: Vec<TrendCell>,
    pub failures: Vec<CellFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One fixed-weight run over one horizon, with its day-by-day curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveReport {
    pub asset1: String,
    pub asset2: String,
    pub as_of: NaiveDate,
    pub weight1: u32,
    pub weight2: u32,
    pub years: u32,
    #[serde(flatten)]
    pub stats: PerformanceStats,
    pub rebalances: usize,
    pub curve: Vec<EquityPoint>,
    /// Asset-1 closes on the curve's dates, rebased to 100.
    pub asset1_normalized: Vec<ChartPoint>,
}

pub fn period_key(years: u32) -> String {
    format!("{years}year")
}

/// `as_of` minus whole calendar years.
pub fn horizon_cutoff(as_of: NaiveDate, years: u32) -> Option<NaiveDate> {
    as_of.checked_sub_months(Months::new(years.saturating_mul(12)))
}

/// Aligned pair for each horizon, sliced to `[as_of - years, as_of]`.
pub fn prepare_horizons(
    series1: &PriceSeries,
    series2: &PriceSeries,
    horizons: &[u32],
    as_of: NaiveDate,
) -> Vec<(u32, Result<AlignedPair, PairfolioError>)> {
    horizons
        .iter()
        .map(|&years| (years, horizon_pair(series1, series2, years, as_of)))
        .collect()
}

fn horizon_pair(
    series1: &PriceSeries,
    series2: &PriceSeries,
    years: u32,
    as_of: NaiveDate,
) -> Result<AlignedPair, PairfolioError> {
    let cutoff = horizon_cutoff(as_of, years).ok_or_else(|| PairfolioError::Data {
        reason: format!("{years}-year horizon before {as_of} is out of range"),
    })?;

    let slice1 = series1.between(cutoff, as_of);
    let slice2 = series2.between(cutoff, as_of);
    let have = slice1.len().min(slice2.len());
    if have < MIN_HORIZON_POINTS {
        return Err(PairfolioError::InsufficientData {
            have,
            need: MIN_HORIZON_POINTS,
        });
    }

    align(&slice1, &slice2)
}

fn resolve_as_of(series1: &PriceSeries, config: &AnalysisConfig) -> Result<NaiveDate, PairfolioError> {
    config
        .as_of
        .or_else(|| series1.last_date())
        .ok_or_else(|| PairfolioError::NoData {
            symbol: series1.symbol.clone(),
        })
}

fn curve_stats(
    curve: &EquityCurve,
    risk_free_rate: f64,
) -> Result<PerformanceStats, PairfolioError> {
    compute_stats(curve, risk_free_rate).ok_or(PairfolioError::InsufficientData {
        have: curve.len(),
        need: 2,
    })
}

fn fixed_run(
    pair: &AlignedPair,
    weight1: u32,
    config: &AnalysisConfig,
) -> Result<(EquityCurve, PerformanceStats), PairfolioError> {
    let curve = simulate_fixed_with_threshold(pair, weight1 as f64, config.rebalance_threshold)?;
    let stats = curve_stats(&curve, config.risk_free_rate)?;
    let extra = config
        .yields
        .blended(&pair.symbol1, &pair.symbol2, weight1 as f64 / 100.0);
    Ok((curve, stats.with_yield(extra, config.risk_free_rate)))
}

fn fixed_cell(
    pair: &AlignedPair,
    weight1: u32,
    config: &AnalysisConfig,
) -> Result<PerformanceStats, PairfolioError> {
    fixed_run(pair, weight1, config).map(|(_, stats)| stats)
}

fn record_failure(failures: &mut Vec<CellFailure>, weight1: Option<u32>, years: u32, err: &PairfolioError) {
    if err.is_insufficient_data() {
        debug!(?weight1, years, %err, "cell skipped");
    } else {
        warn!(?weight1, years, %err, "cell failed");
    }
    failures.push(CellFailure {
        weight1,
        years,
        reason: err.to_string(),
    });
}

/// Fixed-weight stats for every weight in the grid and every horizon.
pub fn run_fixed_sweep(
    series1: &PriceSeries,
    series2: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<SweepReport, PairfolioError> {
    let as_of = resolve_as_of(series1, config)?;
    let horizons = prepare_horizons(series1, series2, &config.horizons, as_of);
    let weights = config.weight_grid();

    let mut failures = Vec::new();
    let mut ready = Vec::new();
    for (years, pair) in &horizons {
        match pair {
            Ok(pair) => ready.push((*years, pair)),
            Err(err) => record_failure(&mut failures, None, *years, err),
        }
    }

    info!(
        weights = weights.len(),
        horizons = ready.len(),
        "running fixed-weight sweep {} / {}",
        series1.symbol,
        series2.symbol
    );

    let cells: Vec<(u32, u32, Result<PerformanceStats, PairfolioError>)> = weights
        .par_iter()
        .flat_map_iter(|&weight1| {
            ready
                .iter()
                .map(move |&(years, pair)| (weight1, years, fixed_cell(pair, weight1, config)))
        })
        .collect();

    let mut rows: Vec<SweepRow> = weights
        .iter()
        .map(|&weight1| SweepRow {
            weight1,
            weight2: 100 - weight1,
            periods: BTreeMap::new(),
        })
        .collect();

    for (weight1, years, outcome) in cells {
        match outcome {
            Ok(stats) => {
                if let Some(row) = rows.iter_mut().find(|r| r.weight1 == weight1) {
                    row.periods.insert(period_key(years), stats);
                }
            }
            Err(err) => record_failure(&mut failures, Some(weight1), years, &err),
        }
    }

    Ok(SweepReport {
        asset1: series1.symbol.clone(),
        asset2: series2.symbol.clone(),
        as_of,
        rows,
        failures,
    })
}

/// Trend-following stats per horizon. The moving average is taken over the
/// full asset-1 history so its warm-up can precede each horizon.
pub fn run_trend_by_horizon(
    series1: &PriceSeries,
    series2: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<TrendReport, PairfolioError> {
    let as_of = resolve_as_of(series1, config)?;
    let ma = moving_average(&series1.between(NaiveDate::MIN, as_of), config.ma_period);
    if ma.is_empty() {
        warn!(
            symbol = %series1.symbol,
            points = series1.len(),
            period = config.ma_period,
            "not enough history for the moving average; regime stays above"
        );
    }
    let params = config.trend_params();
    let horizons = prepare_horizons(series1, series2, &config.horizons, as_of);

    let outcomes: Vec<(u32, Result<TrendCell, PairfolioError>)> = horizons
        .into_par_iter()
        .map(|(years, pair)| {
            let cell = pair.and_then(|pair| {
                let run = simulate_trend(&pair, &ma, &params)?;
                let stats = curve_stats(&run.curve, config.risk_free_rate)?;
                let mean_allocation = run.curve.points.iter().map(|p| p.allocation).sum::<f64>()
                    / run.curve.len() as f64;
                let extra = config
                    .yields
                    .blended(&pair.symbol1, &pair.symbol2, mean_allocation);
                Ok(TrendCell {
                    years,
                    stats: stats.with_yield(extra, config.risk_free_rate),
                    summary: run.summary,
                    curve: run.curve.points,
                })
            });
            (years, cell)
        })
        .collect();

    let mut cells = Vec::new();
    let mut failures = Vec::new();
    for (years, outcome) in outcomes {
        match outcome {
            Ok(cell) => cells.push(cell),
            Err(err) => record_failure(&mut failures, None, years, &err),
        }
    }

    Ok(TrendReport {
        asset1: series1.symbol.clone(),
        asset2: series2.symbol.clone(),
        as_of,
        above_weight: config.above_weight,
        below_weight: config.below_weight,
        ma_period: config.ma_period,
        is_above_ma: is_above_ma(&ma),
        cells,
        failures,
    })
}

/// Fixed-weight run at `weight1` over the `years` horizon, keeping the
/// equity curve and the asset-1 baseline for charting.
pub fn run_fixed_curve(
    series1: &PriceSeries,
    series2: &PriceSeries,
    config: &AnalysisConfig,
    weight1: u32,
    years: u32,
) -> Result<CurveReport, PairfolioError> {
    let as_of = resolve_as_of(series1, config)?;
    let pair = horizon_pair(series1, series2, years, as_of)?;
    let (curve, stats) = fixed_run(&pair, weight1, config)?;

    let baseline = PriceSeries::new(
        pair.symbol1.clone(),
        pair.iter()
            .map(|(date, close1, _)| PricePoint::new(date, close1))
            .collect(),
    )?;
    let asset1_normalized = pair
        .dates()
        .iter()
        .zip(baseline.normalized())
        .map(|(&date, value)| ChartPoint { date, value })
        .collect();

    info!(
        weight1,
        years,
        points = curve.len(),
        end_value = curve.last_value().unwrap_or_default(),
        rebalances = curve.rebalances,
        "fixed-weight curve {} / {}",
        pair.symbol1,
        pair.symbol2
    );

    Ok(CurveReport {
        asset1: series1.symbol.clone(),
        asset2: series2.symbol.clone(),
        as_of,
        weight1,
        weight2: 100 - weight1,
        years,
        stats,
        rebalances: curve.rebalances,
        curve: curve.points,
        asset1_normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_series(symbol: &str, start: NaiveDate, count: usize, f: impl Fn(usize) -> f64) -> PriceSeries {
        PriceSeries::new(
            symbol,
            (0..count)
                .map(|i| PricePoint::new(start + chrono::Duration::days(i as i64), f(i)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn cutoff_subtracts_calendar_years() {
        assert_eq!(horizon_cutoff(date(2024, 6, 30), 1), Some(date(2023, 6, 30)));
        assert_eq!(horizon_cutoff(date(2024, 2, 29), 1), Some(date(2023, 2, 28)));
    }

    #[test]
    fn period_key_format() {
        assert_eq!(period_key(3), "3year");
    }

    #[test]
    fn short_horizon_is_insufficient() {
        let start = date(2024, 1, 1);
        let a = daily_series("A", start, 5, |i| 100.0 + i as f64);
        let b = daily_series("B", start, 5, |_| 50.0);
        let prepared = prepare_horizons(&a, &b, &[1], date(2024, 1, 5));
        assert!(prepared[0].1.as_ref().unwrap_err().is_insufficient_data());
    }

    #[test]
    fn sweep_covers_grid_and_reports_missing_horizons() {
        // About two years of daily data: the 1-year horizon works, 3 and 5
        // still have enough points because the slice is just the whole series.
        let start = date(2022, 1, 1);
        let a = daily_series("A", start, 730, |i| 100.0 * (1.0 + 0.0005 * i as f64));
        let b = daily_series("B", start, 730, |i| 50.0 + (i % 7) as f64 * 0.1);

        let config = AnalysisConfig {
            horizons: vec![1, 3],
            weight_step: 25,
            ..AnalysisConfig::new("A", "B")
        };
        let report = run_fixed_sweep(&a, &b, &config).unwrap();

        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.rows[0].weight1, 0);
        assert_eq!(report.rows[0].weight2, 100);
        assert_eq!(report.rows[4].weight1, 100);
        for row in &report.rows {
            assert!(row.periods.contains_key("1year"));
            assert!(row.periods.contains_key("3year"));
        }
        assert!(report.failures.is_empty());
        assert_eq!(report.as_of, date(2023, 12, 31));
    }

    #[test]
    fn horizon_before_data_leaves_cells_absent() {
        let start = date(2024, 1, 1);
        let a = daily_series("A", start, 30, |i| 100.0 + i as f64);
        let b = daily_series("B", start, 30, |_| 50.0);

        let config = AnalysisConfig {
            horizons: vec![1],
            as_of: Some(date(2030, 1, 1)),
            weight_step: 50,
            ..AnalysisConfig::new("A", "B")
        };
        let report = run_fixed_sweep(&a, &b, &config).unwrap();

        assert_eq!(report.rows.len(), 3);
        assert!(report.rows.iter().all(|r| r.periods.is_empty()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].weight1, None);
    }

    #[test]
    fn degenerate_cell_does_not_fail_the_sweep() {
        let start = date(2024, 1, 1);
        // Asset 1 hits zero on day 20.
        let a = daily_series("A", start, 40, |i| if i == 20 { 0.0 } else { 100.0 });
        let b = daily_series("B", start, 40, |_| 50.0);

        let config = AnalysisConfig {
            horizons: vec![1],
            weight_step: 50,
            ..AnalysisConfig::new("A", "B")
        };
        let report = run_fixed_sweep(&a, &b, &config).unwrap();

        // Every weight sees the zero price; each cell fails on its own.
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures.iter().all(|f| f.weight1.is_some()));
        assert_eq!(report.rows.len(), 3);
    }

    #[test]
    fn best_sharpe_picks_highest() {
        let start = date(2022, 1, 1);
        let a = daily_series("A", start, 500, |i| 100.0 * (1.0 + 0.001 * i as f64) + (i % 3) as f64);
        let b = daily_series("B", start, 500, |i| 50.0 + (i % 5) as f64);

        let config = AnalysisConfig {
            horizons: vec![1],
            weight_step: 10,
            ..AnalysisConfig::new("A", "B")
        };
        let report = run_fixed_sweep(&a, &b, &config).unwrap();
        let (_, best) = report.best_sharpe(1).unwrap();
        for row in &report.rows {
            assert!(row.periods["1year"].sharpe_ratio <= best.sharpe_ratio);
        }
        assert!(report.best_sharpe(7).is_none());
    }

    #[test]
    fn trend_report_per_horizon() {
        let start = date(2021, 1, 1);
        // Rise, fall, rise: the 20-day MA is crossed twice.
        let a = daily_series("A", start, 400, |i| {
            let i = i as f64;
            if i < 150.0 {
                100.0 + i
            } else if i < 250.0 {
                250.0 - (i - 150.0) * 1.5
            } else {
                100.0 + (i - 250.0)
            }
        });
        let b = daily_series("B", start, 400, |_| 50.0);

        let config = AnalysisConfig {
            horizons: vec![1],
            ma_period: 20,
            ..AnalysisConfig::new("A", "B")
        };
        let report = run_trend_by_horizon(&a, &b, &config).unwrap();

        assert_eq!(report.cells.len(), 1);
        assert!(report.failures.is_empty());
        assert!(report.is_above_ma);
        let cell = &report.cells[0];
        assert_eq!(cell.years, 1);
        assert!(cell.summary.limited_crossovers <= cell.summary.total_crossovers);
        assert!(cell.summary.limited_crossovers >= 1);
        assert_eq!(cell.curve.len(), 366);
        assert_eq!(cell.curve[0].value, 100.0);

        let json = serde_json::to_value(cell).unwrap();
        assert_eq!(json["curve"].as_array().unwrap().len(), 366);
        assert!(json["curve"][0].get("allocation").is_none());
    }

    #[test]
    fn fixed_curve_keeps_every_day_and_baseline() {
        let start = date(2023, 1, 1);
        let a = daily_series("A", start, 60, |i| 100.0 + i as f64);
        let b = daily_series("B", start, 60, |i| 50.0 + (i % 4) as f64);

        let config = AnalysisConfig::new("A", "B");
        let report = run_fixed_curve(&a, &b, &config, 100, 1).unwrap();

        assert_eq!(report.weight2, 0);
        assert_eq!(report.curve.len(), 60);
        assert_eq!(report.asset1_normalized.len(), 60);
        assert_eq!(report.curve[0].value, 100.0);
        // All in asset 1: the curve is the rebased asset-1 series.
        for (point, base) in report.curve.iter().zip(&report.asset1_normalized) {
            assert_eq!(point.date, base.date);
            assert!((point.value - base.value).abs() < 1e-9);
        }
    }

    #[test]
    fn fixed_curve_rejects_bad_weight_and_short_horizon() {
        let start = date(2024, 1, 1);
        let a = daily_series("A", start, 30, |i| 100.0 + i as f64);
        let b = daily_series("B", start, 30, |_| 50.0);
        let config = AnalysisConfig::new("A", "B");

        assert!(matches!(
            run_fixed_curve(&a, &b, &config, 120, 1),
            Err(PairfolioError::InvalidWeight { .. })
        ));

        let short = daily_series("A", start, 5, |i| 100.0 + i as f64);
        let err = run_fixed_curve(&short, &b, &config, 50, 1).unwrap_err();
        assert!(err.is_insufficient_data());
    }
}
