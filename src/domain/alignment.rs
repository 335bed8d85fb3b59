//! Intersection of two price series onto their common trading days.

use crate::domain::error::PairfolioError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fewest common dates a pair needs before anything can be simulated.
pub const MIN_COMMON_DATES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub symbol1: String,
    pub symbol2: String,
    dates: Vec<NaiveDate>,
    closes1: Vec<f64>,
    closes2: Vec<f64>,
    date_index: HashMap<NaiveDate, usize>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes1(&self) -> &[f64] {
        &self.closes1
    }

    pub fn closes2(&self) -> &[f64] {
        &self.closes2
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Both closes on `date`, if it is a common date.
    pub fn prices_on(&self, date: NaiveDate) -> Option<(f64, f64)> {
        self.date_index
            .get(&date)
            .map(|&i| (self.closes1[i], self.closes2[i]))
    }

    /// `(date, close1, close2)` in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64, f64)> + '_ {
        self.dates
            .iter()
            .zip(&self.closes1)
            .zip(&self.closes2)
            .map(|((&d, &p1), &p2)| (d, p1, p2))
    }
}

/// Keeps only the dates present in both series, matched exactly.
///
/// Returns [`PairfolioError::InsufficientData`] when fewer than
/// [`MIN_COMMON_DATES`] dates are shared.
pub fn align(series1: &PriceSeries, series2: &PriceSeries) -> Result<AlignedPair, PairfolioError> {
    let lookup: HashMap<NaiveDate, f64> = series2
        .points()
        .iter()
        .map(|p| (p.date, p.close))
        .collect();

    let mut dates = Vec::new();
    let mut closes1 = Vec::new();
    let mut closes2 = Vec::new();

    for point in series1.points() {
        if let Some(&close2) = lookup.get(&point.date) {
            dates.push(point.date);
            closes1.push(point.close);
            closes2.push(close2);
        }
    }

    if dates.len() < MIN_COMMON_DATES {
        return Err(PairfolioError::InsufficientData {
            have: dates.len(),
            need: MIN_COMMON_DATES,
        });
    }

    let date_index = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

    Ok(AlignedPair {
        symbol1: series1.symbol.clone(),
        symbol2: series2.symbol.clone(),
        dates,
        closes1,
        closes2,
        date_index,
    })
}
