//! Performance statistics over an equity curve.

use super::simulation::{EquityCurve, EquityPoint};
use serde::Serialize;
use std::collections::HashMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.0;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Spans shorter than this (about 29 days) report a zero CAGR.
pub const MIN_ANNUALIZATION_YEARS: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub mdd: f64,
}

impl PerformanceStats {
    /// Stats for `curve`, or `None` when it has fewer than two points.
    pub fn compute(curve: &EquityCurve, risk_free_rate: f64) -> Option<Self> {
        let points = &curve.points;
        if points.len() < 2 {
            return None;
        }

        let annual_return = compute_cagr(points);
        let volatility = compute_volatility(points);
        let sharpe_ratio = sharpe(annual_return, volatility, risk_free_rate);
        let mdd = compute_drawdown(points);

        Some(PerformanceStats {
            annual_return,
            volatility,
            sharpe_ratio,
            mdd,
        })
    }

    /// Adds a flat annual yield (e.g. dividends not reflected in closes) to
    /// the return and re-derives the Sharpe ratio.
    pub fn with_yield(mut self, extra_annual_yield: f64, risk_free_rate: f64) -> Self {
        if extra_annual_yield != 0.0 {
            self.annual_return += extra_annual_yield;
            self.sharpe_ratio = sharpe(self.annual_return, self.volatility, risk_free_rate);
        }
        self
    }
}

/// `compute_stats(curve, risk_free_rate)` in free-function form.
pub fn compute_stats(curve: &EquityCurve, risk_free_rate: f64) -> Option<PerformanceStats> {
    PerformanceStats::compute(curve, risk_free_rate)
}

fn sharpe(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility > 0.0 {
        (annual_return - risk_free_rate) / volatility
    } else {
        0.0
    }
}

fn compute_cagr(points: &[EquityPoint]) -> f64 {
    let (first, last) = (&points[0], &points[points.len() - 1]);
    let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
    if years < MIN_ANNUALIZATION_YEARS || first.value <= 0.0 {
        return 0.0;
    }
    (last.value / first.value).powf(1.0 / years) - 1.0
}

/// Population stdev of day-over-day simple returns, annualized.
fn compute_volatility(points: &[EquityPoint]) -> f64 {
    let returns: Vec<f64> = points
        .windows(2)
        .map(|w| {
            if w[0].value > 0.0 {
                w[1].value / w[0].value - 1.0
            } else {
                0.0
            }
        })
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

fn compute_drawdown(points: &[EquityPoint]) -> f64 {
    let mut peak = points[0].value;
    let mut max_dd = 0.0_f64;

    for point in points {
        if point.value > peak {
            peak = point.value;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Annual yield add-ons keyed by symbol (case-insensitive). Symbols not in
/// the table contribute nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YieldTable {
    yields: HashMap<String, f64>,
}

impl YieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, annual_yield: f64) {
        self.yields.insert(symbol.to_uppercase(), annual_yield);
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.yields
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.yields.is_empty()
    }

    /// Yield of a two-asset allocation holding `fraction1` in `symbol1`.
    pub fn blended(&self, symbol1: &str, symbol2: &str, fraction1: f64) -> f64 {
        self.get(symbol1) * fraction1 + self.get(symbol2) * (1.0 - fraction1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_curve(values: &[f64], step_days: i64) -> EquityCurve {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        EquityCurve {
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| EquityPoint {
                    date: start + chrono::Duration::days(i as i64 * step_days),
                    value: v,
                    allocation: 0.5,
                })
                .collect(),
            rebalances: 0,
        }
    }

    #[test]
    fn fewer_than_two_points_is_unavailable() {
        assert!(compute_stats(&make_curve(&[], 1), 0.02).is_none());
        assert!(compute_stats(&make_curve(&[100.0], 1), 0.02).is_none());
    }

    #[test]
    fn cagr_over_one_year() {
        // Two points 365 days apart.
        let curve = make_curve(&[100.0, 110.0], 365);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_abs_diff_eq!(stats.annual_return, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn cagr_over_two_years_compounds() {
        let curve = make_curve(&[100.0, 121.0], 730);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_abs_diff_eq!(stats.annual_return, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn short_span_reports_zero_cagr() {
        // 28 days is under the annualization floor.
        let curve = make_curve(&[100.0, 150.0], 28);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_eq!(stats.annual_return, 0.0);
    }

    #[test]
    fn thirty_days_is_annualized() {
        let curve = make_curve(&[100.0, 101.0], 30);
        let stats = compute_stats(&curve, 0.02).unwrap();
        let expected = 1.01_f64.powf(365.0 / 30.0) - 1.0;
        assert_abs_diff_eq!(stats.annual_return, expected, epsilon = 1e-12);
    }

    #[test]
    fn flat_curve_has_zero_volatility_and_sharpe() {
        let curve = make_curve(&[100.0; 50], 1);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_eq!(stats.volatility, 0.0);
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.mdd, 0.0);
    }

    #[test]
    fn volatility_is_population_stdev_annualized() {
        // Returns: +10%, -10% -> mean 0, population stdev 0.1.
        let curve = make_curve(&[100.0, 110.0, 99.0], 1);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_abs_diff_eq!(stats.volatility, 0.1 * 252.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sharpe_uses_excess_cagr_over_volatility() {
        let curve = make_curve(&[100.0, 110.0, 99.0, 120.0], 200);
        let stats = compute_stats(&curve, 0.02).unwrap();
        let expected = (stats.annual_return - 0.02) / stats.volatility;
        assert_abs_diff_eq!(stats.sharpe_ratio, expected, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_from_running_peak() {
        let curve = make_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0], 1);
        let stats = compute_stats(&curve, 0.02).unwrap();
        assert_abs_diff_eq!(stats.mdd, (110.0 - 80.0) / 110.0, epsilon = 1e-12);
    }

    #[test]
    fn increasing_curve_has_no_drawdown() {
        let curve = make_curve(&[100.0, 101.0, 103.0, 108.0], 1);
        assert_eq!(compute_stats(&curve, 0.02).unwrap().mdd, 0.0);
    }

    #[test]
    fn yield_adjustment_shifts_return_and_sharpe() {
        let curve = make_curve(&[100.0, 110.0, 99.0, 120.0], 200);
        let base = compute_stats(&curve, 0.02).unwrap();
        let adjusted = base.clone().with_yield(0.035, 0.02);

        assert_abs_diff_eq!(adjusted.annual_return, base.annual_return + 0.035, epsilon = 1e-12);
        assert_abs_diff_eq!(
            adjusted.sharpe_ratio,
            (base.annual_return + 0.035 - 0.02) / base.volatility,
            epsilon = 1e-12
        );
        assert_eq!(adjusted.volatility, base.volatility);
        assert_eq!(adjusted.mdd, base.mdd);
    }

    #[test]
    fn yield_table_blends_by_allocation() {
        let mut table = YieldTable::new();
        table.insert("schd", 0.035);

        assert_eq!(table.get("SCHD"), 0.035);
        assert_eq!(table.get("TQQQ"), 0.0);
        assert_abs_diff_eq!(table.blended("TQQQ", "SCHD", 0.6), 0.014, epsilon = 1e-12);
        assert!(!table.is_empty());
    }

    #[test]
    fn stats_serialize_with_caller_field_names() {
        let curve = make_curve(&[100.0, 110.0], 365);
        let json = serde_json::to_value(compute_stats(&curve, 0.02).unwrap()).unwrap();
        assert!(json.get("annualReturn").is_some());
        assert!(json.get("volatility").is_some());
        assert!(json.get("sharpeRatio").is_some());
        assert!(json.get("mdd").is_some());
    }
}
