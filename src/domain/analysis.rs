//! Parameters for one analysis run.

use crate::domain::metrics::{DEFAULT_RISK_FREE_RATE, YieldTable};
use crate::domain::moving_average::DEFAULT_MA_PERIOD;
use crate::domain::simulation::{
    DEFAULT_COOLDOWN_DAYS, DEFAULT_REBALANCE_THRESHOLD, TrendParams,
};
use chrono::NaiveDate;

pub const DEFAULT_HORIZONS: [u32; 4] = [1, 3, 5, 10];
pub const DEFAULT_WEIGHT_STEP: u32 = 5;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Fast asset; the moving average is taken over this one.
    pub asset1: String,
    pub asset2: String,
    /// Horizon end date; `None` means the last date of asset 1.
    pub as_of: Option<NaiveDate>,
    pub horizons: Vec<u32>,
    pub weight_step: u32,
    pub rebalance_threshold: f64,
    pub risk_free_rate: f64,
    pub ma_period: usize,
    pub above_weight: f64,
    pub below_weight: f64,
    pub cooldown_days: i64,
    pub yields: YieldTable,
}

impl AnalysisConfig {
    pub fn new(asset1: impl Into<String>, asset2: impl Into<String>) -> Self {
        Self {
            asset1: asset1.into(),
            asset2: asset2.into(),
            as_of: None,
            horizons: DEFAULT_HORIZONS.to_vec(),
            weight_step: DEFAULT_WEIGHT_STEP,
            rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            ma_period: DEFAULT_MA_PERIOD,
            above_weight: 100.0,
            below_weight: 0.0,
            cooldown_days: DEFAULT_COOLDOWN_DAYS,
            yields: YieldTable::new(),
        }
    }

    /// Asset-1 weights swept: 0, step, 2*step, ... up to 100.
    pub fn weight_grid(&self) -> Vec<u32> {
        let step = self.weight_step.clamp(1, 100) as usize;
        (0..=100u32).step_by(step).collect()
    }

    pub fn trend_params(&self) -> TrendParams {
        TrendParams {
            above_weight: self.above_weight,
            below_weight: self.below_weight,
            cooldown_days: self.cooldown_days,
            rebalance_threshold: self.rebalance_threshold,
        }
    }
}
