#![allow(dead_code)]

use chrono::NaiveDate;
use pairfolio::domain::error::PairfolioError;
pub use pairfolio::domain::price::{PricePoint, PriceSeries};
use pairfolio::ports::data_port::PriceDataPort;
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub fetches: Cell<usize>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_uppercase(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_uppercase(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, PairfolioError> {
        self.fetches.set(self.fetches.get() + 1);
        let key = symbol.to_uppercase();
        if let Some(reason) = self.errors.get(&key) {
            return Err(PairfolioError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(&key) {
            Some(points) if !points.is_empty() => PriceSeries::new(key, points.clone()),
            _ => Err(PairfolioError::NoData { symbol: key }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairfolioError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(date: &str, close: f64) -> PricePoint {
    PricePoint::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), close)
}

/// One point per calendar day from `start`.
pub fn daily_points(start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn daily_series(symbol: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, daily_points(start, closes)).unwrap()
}

/// Deterministic wavy price path: a drift plus two sine components.
pub fn wavy_closes(count: usize, base: f64, drift: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            base * (1.0 + drift * t)
                + amplitude * (t / 17.0).sin()
                + amplitude * 0.5 * (t / 5.0).cos()
        })
        .collect()
}

/// The 10-day A/B scenario used for the fixed-weight golden value.
pub fn golden_pair() -> (PriceSeries, PriceSeries) {
    let start = date(2024, 1, 1);
    let a = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0, 108.0, 107.0, 110.0];
    let b = [50.0, 50.5, 50.2, 50.8, 51.0, 50.9, 51.2, 51.5, 51.3, 52.0];
    (daily_series("A", start, &a), daily_series("B", start, &b))
}
