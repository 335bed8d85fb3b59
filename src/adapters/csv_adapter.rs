//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a `date,close` header and
//! an optional `volume` column.

use crate::domain::error::PairfolioError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, PairfolioError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| PairfolioError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.deserialize::<CsvRow>() {
            let row = result.map_err(|e| PairfolioError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                PairfolioError::Data {
                    reason: format!("invalid date {:?}: {}", row.date, e),
                }
            })?;

            // Rows without a close are gaps in the provider data.
            let Some(close) = row.close else {
                skipped += 1;
                continue;
            };

            points.push(PricePoint {
                date,
                close,
                volume: row.volume,
            });
        }

        if points.is_empty() {
            return Err(PairfolioError::NoData {
                symbol: symbol.to_uppercase(),
            });
        }

        debug!(
            symbol,
            points = points.len(),
            skipped,
            "loaded {}",
            path.display()
        );
        PriceSeries::new(symbol.to_uppercase(), points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairfolioError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PairfolioError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PairfolioError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
