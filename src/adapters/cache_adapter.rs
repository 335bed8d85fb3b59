//! Time-bounded cache of fetched price series.
//!
//! Wraps any [`PriceDataPort`]. Entries are keyed by upper-cased symbol and
//! expire `ttl` after they were fetched. The cache is an ordinary value owned
//! by whoever builds it and passed by reference to its users.

use crate::domain::error::PairfolioError;
use crate::domain::price::PriceSeries;
use crate::ports::data_port::PriceDataPort;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    series: PriceSeries,
}

pub struct CachedDataAdapter<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<P: PriceDataPort> CachedDataAdapter<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// True when `symbol` has an entry younger than the TTL.
    pub fn is_fresh(&self, symbol: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&symbol.to_uppercase())
            .is_some_and(|e| e.fetched_at.elapsed() < self.ttl)
    }

    pub fn invalidate(&self, symbol: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&symbol.to_uppercase());
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }
}

impl<P: PriceDataPort> PriceDataPort for CachedDataAdapter<P> {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, PairfolioError> {
        let key = symbol.to_uppercase();
        {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!(symbol = %key, "series cache hit");
                    return Ok(entry.series.clone());
                }
            }
        }

        // Fetch outside the lock; a concurrent miss may fetch twice.
        let series = self.inner.fetch_series(symbol)?;
        debug!(symbol = %key, points = series.len(), "series cache refresh");

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                series: series.clone(),
            },
        );
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairfolioError> {
        self.inner.list_symbols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPort {
        calls: AtomicUsize,
    }

    impl CountingPort {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceDataPort for CountingPort {
        fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, PairfolioError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.eq_ignore_ascii_case("missing") {
                return Err(PairfolioError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            PriceSeries::new(
                symbol.to_uppercase(),
                vec![PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0)],
            )
        }

        fn list_symbols(&self) -> Result<Vec<String>, PairfolioError> {
            Ok(vec!["GLD".into(), "TQQQ".into()])
        }
    }

    #[test]
    fn second_fetch_within_ttl_hits_cache() {
        let cache = CachedDataAdapter::new(CountingPort::new(), DEFAULT_CACHE_TTL);

        let first = cache.fetch_series("tqqq").unwrap();
        let second = cache.fetch_series("TQQQ").unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_fresh("Tqqq"));
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let cache = CachedDataAdapter::new(CountingPort::new(), Duration::ZERO);

        cache.fetch_series("GLD").unwrap();
        cache.fetch_series("GLD").unwrap();

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_fresh("GLD"));
    }

    #[test]
    fn invalidate_forces_refetch() {
        let cache = CachedDataAdapter::new(CountingPort::new(), DEFAULT_CACHE_TTL);

        cache.fetch_series("GLD").unwrap();
        cache.invalidate("gld");
        cache.fetch_series("GLD").unwrap();

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = CachedDataAdapter::new(CountingPort::new(), DEFAULT_CACHE_TTL);

        assert!(cache.fetch_series("missing").is_err());
        assert!(cache.fetch_series("missing").is_err());
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_fresh("missing"));
    }

    #[test]
    fn clear_drops_all_entries() {
        let cache = CachedDataAdapter::new(CountingPort::new(), DEFAULT_CACHE_TTL);
        cache.fetch_series("GLD").unwrap();
        cache.fetch_series("TQQQ").unwrap();
        cache.clear();
        assert!(!cache.is_fresh("GLD"));
        assert!(!cache.is_fresh("TQQQ"));
        assert_eq!(cache.list_symbols().unwrap(), vec!["GLD", "TQQQ"]);
    }
}
