//! Configuration validation.
//!
//! Checks every analysis field before any data is loaded.

use crate::domain::error::PairfolioError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    validate_data_directory(config)?;
    validate_assets(config)?;
    validate_as_of(config)?;
    validate_horizons(config)?;
    validate_weight_step(config)?;
    validate_rebalance_threshold(config)?;
    validate_risk_free_rate(config)?;
    validate_trend(config)?;
    validate_yields(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PairfolioError {
    PairfolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, PairfolioError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(PairfolioError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_data_directory(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    require_non_empty(config, "data", "directory")?;
    if config.get_int("data", "cache_ttl_secs", 0) < 0 {
        return Err(invalid("data", "cache_ttl_secs", "cache_ttl_secs must be non-negative"));
    }
    Ok(())
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    let asset1 = require_non_empty(config, "analysis", "asset1")?;
    let asset2 = require_non_empty(config, "analysis", "asset2")?;
    if asset1.eq_ignore_ascii_case(&asset2) {
        return Err(invalid("analysis", "asset2", "asset2 must differ from asset1"));
    }
    Ok(())
}

fn validate_as_of(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    match config.get_string("analysis", "as_of") {
        None => Ok(()),
        Some(s) if s.trim().is_empty() => Ok(()),
        Some(s) => parse_date(&s, "analysis", "as_of").map(|_| ()),
    }
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, PairfolioError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD")))
}

/// Comma-separated positive year counts, e.g. `1, 3, 5, 10`.
pub fn parse_horizons(value: &str) -> Result<Vec<u32>, PairfolioError> {
    let mut horizons = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<u32>() {
            Ok(years) if years > 0 => horizons.push(years),
            _ => {
                return Err(invalid(
                    "analysis",
                    "horizons",
                    format!("{part:?} is not a positive whole number of years"),
                ));
            }
        }
    }
    if horizons.is_empty() {
        return Err(invalid("analysis", "horizons", "at least one horizon is required"));
    }
    Ok(horizons)
}

fn validate_horizons(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    match config.get_string("analysis", "horizons") {
        None => Ok(()),
        Some(s) => parse_horizons(&s).map(|_| ()),
    }
}

fn validate_weight_step(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    let step = config.get_int("analysis", "weight_step", 5);
    if !(1..=100).contains(&step) {
        return Err(invalid("analysis", "weight_step", "weight_step must be between 1 and 100"));
    }
    Ok(())
}

fn validate_rebalance_threshold(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    let value = config.get_double("analysis", "rebalance_threshold", 0.03);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "analysis",
            "rebalance_threshold",
            "rebalance_threshold must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    let value = config.get_double("analysis", "risk_free_rate", 0.02);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "analysis",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_trend(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    if config.get_int("trend", "ma_period", 200) < 1 {
        return Err(invalid("trend", "ma_period", "ma_period must be at least 1"));
    }
    for key in ["above_weight", "below_weight"] {
        let default = if key == "above_weight" { 100.0 } else { 0.0 };
        let weight = config.get_double("trend", key, default);
        if !(0.0..=100.0).contains(&weight) {
            return Err(invalid("trend", key, format!("{key} must be between 0 and 100")));
        }
    }
    if config.get_int("trend", "cooldown_days", 2) < 0 {
        return Err(invalid("trend", "cooldown_days", "cooldown_days must be non-negative"));
    }
    Ok(())
}

fn validate_yields(config: &dyn ConfigPort) -> Result<(), PairfolioError> {
    for symbol in config.keys("yield") {
        let raw = config.get_string("yield", &symbol).unwrap_or_default();
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > -1.0 && v < 1.0 => {}
            _ => {
                return Err(invalid(
                    "yield",
                    &symbol,
                    "annual yield must be a fraction between -1 and 1",
                ));
            }
        }
    }
    Ok(())
}
