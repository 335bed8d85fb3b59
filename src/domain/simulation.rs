//! Two-asset portfolio simulation with threshold rebalancing.
//!
//! One loop drives both allocation policies. Each day the holdings are
//! revalued, the policy supplies the target fraction for asset 1, and the
//! holdings are reset to that target when the actual fraction has drifted
//! more than the rebalance threshold away from it.

use crate::domain::alignment::AlignedPair;
use crate::domain::error::PairfolioError;
use crate::domain::moving_average::MaSeries;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::trace;

pub const INITIAL_VALUE: f64 = 100.0;
pub const DEFAULT_REBALANCE_THRESHOLD: f64 = 0.03;
pub const DEFAULT_COOLDOWN_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Asset-1 value fraction held after the day's trades.
    #[serde(skip)]
    pub allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
    #[serde(skip)]
    pub rebalances: usize,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

/// Supplies the asset-1 target fraction in `[0, 1]` for each simulated date.
pub trait TargetPolicy {
    /// Fraction used to build the opening holdings on the first date.
    fn initial_fraction(&mut self, date: NaiveDate) -> f64;

    /// Fraction to rebalance toward on a later date.
    fn target_fraction(&mut self, date: NaiveDate) -> f64;
}

/// Static target weight.
#[derive(Debug, Clone, Copy)]
pub struct FixedWeight {
    fraction: f64,
}

impl FixedWeight {
    pub fn new(weight1: f64) -> Result<Self, PairfolioError> {
        Ok(Self {
            fraction: weight_fraction(weight1)?,
        })
    }
}

impl TargetPolicy for FixedWeight {
    fn initial_fraction(&mut self, _date: NaiveDate) -> f64 {
        self.fraction
    }

    fn target_fraction(&mut self, _date: NaiveDate) -> f64 {
        self.fraction
    }
}

/// Target weight switched by the asset-1 moving-average regime.
///
/// A switch is accepted when the MA state on a date differs from the last
/// accepted state and at least `cooldown_days` calendar days have passed
/// since the last accepted switch (or since the first simulated date).
/// Dates without an MA observation keep the current target.
#[derive(Debug, Clone)]
pub struct TrendFollowing<'a> {
    ma: &'a MaSeries,
    above_fraction: f64,
    below_fraction: f64,
    cooldown_days: i64,
    above: bool,
    last_switch: Option<NaiveDate>,
    switch_dates: Vec<NaiveDate>,
}

impl<'a> TrendFollowing<'a> {
    pub fn new(
        ma: &'a MaSeries,
        above_weight: f64,
        below_weight: f64,
        cooldown_days: i64,
    ) -> Result<Self, PairfolioError> {
        Ok(Self {
            ma,
            above_fraction: weight_fraction(above_weight)?,
            below_fraction: weight_fraction(below_weight)?,
            cooldown_days,
            above: true,
            last_switch: None,
            switch_dates: Vec::new(),
        })
    }

    fn current_fraction(&self) -> f64 {
        if self.above {
            self.above_fraction
        } else {
            self.below_fraction
        }
    }

    pub fn switch_dates(&self) -> &[NaiveDate] {
        &self.switch_dates
    }
}

impl TargetPolicy for TrendFollowing<'_> {
    fn initial_fraction(&mut self, date: NaiveDate) -> f64 {
        self.above = self.ma.state_on(date).unwrap_or(true);
        self.last_switch = Some(date);
        self.current_fraction()
    }

    fn target_fraction(&mut self, date: NaiveDate) -> f64 {
        let Some(above) = self.ma.state_on(date) else {
            return self.current_fraction();
        };

        if above != self.above {
            let elapsed = self
                .last_switch
                .map(|last| (date - last).num_days())
                .unwrap_or(i64::MAX);
            if elapsed >= self.cooldown_days {
                trace!(%date, above, "regime switch accepted");
                self.above = above;
                self.last_switch = Some(date);
                self.switch_dates.push(date);
            }
        }
        self.current_fraction()
    }
}

fn weight_fraction(weight: f64) -> Result<f64, PairfolioError> {
    if !(0.0..=100.0).contains(&weight) {
        return Err(PairfolioError::InvalidWeight { weight });
    }
    Ok(weight / 100.0)
}

fn check_price(date: NaiveDate, price: f64) -> Result<(), PairfolioError> {
    if price > 0.0 && price.is_finite() {
        Ok(())
    } else {
        Err(PairfolioError::DegenerateValue { date, value: price })
    }
}

/// Runs the shared simulation loop over `pair` with `policy` choosing the
/// target fraction each day.
pub fn simulate<P: TargetPolicy>(
    pair: &AlignedPair,
    policy: &mut P,
    rebalance_threshold: f64,
) -> Result<EquityCurve, PairfolioError> {
    let mut rows = pair.iter();
    let Some((first_date, first1, first2)) = rows.next() else {
        return Err(PairfolioError::InsufficientData { have: 0, need: 2 });
    };
    check_price(first_date, first1)?;
    check_price(first_date, first2)?;

    let opening = policy.initial_fraction(first_date);
    let mut shares1 = INITIAL_VALUE * opening / first1;
    let mut shares2 = INITIAL_VALUE * (1.0 - opening) / first2;

    let mut points = Vec::with_capacity(pair.len());
    points.push(EquityPoint {
        date: first_date,
        value: INITIAL_VALUE,
        allocation: opening,
    });
    let mut rebalances = 0usize;

    for (date, price1, price2) in rows {
        check_price(date, price1)?;
        check_price(date, price2)?;

        let value1 = shares1 * price1;
        let value2 = shares2 * price2;
        let total = value1 + value2;
        if !(total > 0.0 && total.is_finite()) {
            return Err(PairfolioError::DegenerateValue { date, value: total });
        }

        let target = policy.target_fraction(date);
        let mut allocation = value1 / total;
        if (allocation - target).abs() > rebalance_threshold {
            shares1 = total * target / price1;
            shares2 = total * (1.0 - target) / price2;
            allocation = target;
            rebalances += 1;
        }

        points.push(EquityPoint {
            date,
            value: total,
            allocation,
        });
    }

    Ok(EquityCurve { points, rebalances })
}

/// Fixed-weight portfolio, `weight1` percent in asset 1, rebalanced at the
/// default threshold.
pub fn simulate_fixed(pair: &AlignedPair, weight1: f64) -> Result<EquityCurve, PairfolioError> {
    simulate_fixed_with_threshold(pair, weight1, DEFAULT_REBALANCE_THRESHOLD)
}

pub fn simulate_fixed_with_threshold(
    pair: &AlignedPair,
    weight1: f64,
    rebalance_threshold: f64,
) -> Result<EquityCurve, PairfolioError> {
    let mut policy = FixedWeight::new(weight1)?;
    simulate(pair, &mut policy, rebalance_threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSummary {
    /// Raw MA crossovers inside the simulated date range.
    pub total_crossovers: usize,
    /// Regime switches actually applied after the cooldown gate.
    pub limited_crossovers: usize,
    pub switch_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendRun {
    pub curve: EquityCurve,
    pub summary: SwitchSummary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendParams {
    pub above_weight: f64,
    pub below_weight: f64,
    pub cooldown_days: i64,
    pub rebalance_threshold: f64,
}

impl TrendParams {
    pub fn new(above_weight: f64, below_weight: f64) -> Self {
        Self {
            above_weight,
            below_weight,
            cooldown_days: DEFAULT_COOLDOWN_DAYS,
            rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
        }
    }
}

/// Trend-following portfolio driven by `ma` (computed on asset 1).
pub fn simulate_trend(
    pair: &AlignedPair,
    ma: &MaSeries,
    params: &TrendParams,
) -> Result<TrendRun, PairfolioError> {
    let mut policy = TrendFollowing::new(
        ma,
        params.above_weight,
        params.below_weight,
        params.cooldown_days,
    )?;
    let curve = simulate(pair, &mut policy, params.rebalance_threshold)?;

    let summary = SwitchSummary {
        total_crossovers: ma.crossovers_between(pair.first_date(), pair.last_date()),
        limited_crossovers: policy.switch_dates().len(),
        switch_dates: policy.switch_dates().to_vec(),
    };

    Ok(TrendRun { curve, summary })
}
