//! Price data access port.

use crate::domain::error::PairfolioError;
use crate::domain::price::PriceSeries;

/// Supplies daily close series by symbol. Implementations own any I/O and
/// caching; the domain only ever sees resident, read-only series.
pub trait PriceDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, PairfolioError>;

    fn list_symbols(&self) -> Result<Vec<String>, PairfolioError>;
}
