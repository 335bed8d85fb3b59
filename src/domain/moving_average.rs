//! Simple moving average and crossover detection.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n, defined for i >= n-1.
//! Warmup: the first (n-1) closes produce no point.
//! aboveMA[i] = C[i] > SMA(n)[i] (equal counts as not above).

use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_MA_PERIOD: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub ma: f64,
    #[serde(rename = "aboveMA")]
    pub above_ma: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossType {
    Up,
    Down,
}

impl fmt::Display for CrossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossType::Up => write!(f, "up"),
            CrossType::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crossover {
    pub date: NaiveDate,
    pub price: f64,
    pub ma: f64,
    #[serde(rename = "crossType")]
    pub cross_type: CrossType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaSeries {
    pub period: usize,
    pub values: Vec<MaPoint>,
    pub crossovers: Vec<Crossover>,
}

impl MaSeries {
    /// Builds the series from date-ordered points, emitting a crossover
    /// wherever `above_ma` flips between consecutive points.
    pub fn from_points(period: usize, values: Vec<MaPoint>) -> Self {
        let crossovers = values
            .windows(2)
            .filter(|w| w[0].above_ma != w[1].above_ma)
            .map(|w| Crossover {
                date: w[1].date,
                price: w[1].price,
                ma: w[1].ma,
                cross_type: if w[1].above_ma {
                    CrossType::Up
                } else {
                    CrossType::Down
                },
            })
            .collect();

        Self {
            period,
            values,
            crossovers,
        }
    }

    pub fn empty(period: usize) -> Self {
        Self {
            period,
            values: Vec::new(),
            crossovers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<&MaPoint> {
        self.values.last()
    }

    /// The MA observation on `date`, if one exists.
    pub fn point_on(&self, date: NaiveDate) -> Option<&MaPoint> {
        self.values
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.values[i])
    }

    pub fn state_on(&self, date: NaiveDate) -> Option<bool> {
        self.point_on(date).map(|p| p.above_ma)
    }

    /// Crossovers dated within `[start, end]`.
    pub fn crossovers_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.crossovers
            .iter()
            .filter(|c| c.date >= start && c.date <= end)
            .count()
    }
}

/// Trailing SMA over `series` closes. Fewer than `period` closes (or a zero
/// period) yields an empty series.
pub fn moving_average(series: &PriceSeries, period: usize) -> MaSeries {
    let points = series.points();
    if period == 0 || points.len() < period {
        return MaSeries::empty(period);
    }

    let values = (period - 1..points.len())
        .map(|i| {
            let window = &points[i + 1 - period..=i];
            let ma = window.iter().map(|p| p.close).sum::<f64>() / period as f64;
            let price = points[i].close;
            MaPoint {
                date: points[i].date,
                price,
                ma,
                above_ma: price > ma,
            }
        })
        .collect();

    MaSeries::from_points(period, values)
}

/// State of the most recent MA point. An empty series reports `true`.
pub fn is_above_ma(ma: &MaSeries) -> bool {
    ma.latest().map(|p| p.above_ma).unwrap_or(true)
}
