//! Daily close prices for a single symbol.

use crate::domain::error::PairfolioError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            volume: None,
        }
    }
}

/// Date-ordered closes with unique dates. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts `points` by date and rejects duplicate dates.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self, PairfolioError> {
        let symbol = symbol.into();
        points.sort_by_key(|p| p.date);

        if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(PairfolioError::MalformedSeries {
                symbol,
                reason: format!("duplicate date {}", w[0].date),
            });
        }

        Ok(Self { symbol, points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    /// Points dated within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end).max(lo);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[lo..hi].to_vec(),
        }
    }

    /// Closes rebased so the first point is 100.
    pub fn normalized(&self) -> Vec<f64> {
        match self.points.first() {
            Some(first) if first.close > 0.0 => {
                self.closes().map(|c| c / first.close * 100.0).collect()
            }
            _ => Vec::new(),
        }
    }
}
