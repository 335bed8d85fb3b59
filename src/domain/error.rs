//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for pairfolio.
#[derive(Debug, thiserror::Error)]
pub enum PairfolioError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("malformed price series {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },

    #[error("insufficient data: have {have} points, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("degenerate value {value} on {date}")]
    DegenerateValue { date: NaiveDate, value: f64 },

    #[error("weight {weight} outside [0, 100]")]
    InvalidWeight { weight: f64 },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PairfolioError {
    /// True for the recoverable "no result" class: too few common dates or
    /// observations. Callers surface these as absent results.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PairfolioError::InsufficientData { .. })
    }
}

impl From<&PairfolioError> for std::process::ExitCode {
    fn from(err: &PairfolioError) -> Self {
        let code: u8 = match err {
            PairfolioError::Io(_) | PairfolioError::Report { .. } => 1,
            PairfolioError::ConfigParse { .. }
            | PairfolioError::ConfigMissing { .. }
            | PairfolioError::ConfigInvalid { .. }
            | PairfolioError::InvalidWeight { .. } => 2,
            PairfolioError::Data { .. }
            | PairfolioError::NoData { .. }
            | PairfolioError::MalformedSeries { .. } => 3,
            PairfolioError::InsufficientData { .. } | PairfolioError::DegenerateValue { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = PairfolioError::InsufficientData { have: 1, need: 2 };
        assert_eq!(err.to_string(), "insufficient data: have 1 points, need 2");
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn degenerate_value_message() {
        let err = PairfolioError::DegenerateValue {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            value: -1.5,
        };
        assert_eq!(err.to_string(), "degenerate value -1.5 on 2024-03-01");
        assert!(!err.is_insufficient_data());
    }

    #[test]
    fn config_invalid_message() {
        let err = PairfolioError::ConfigInvalid {
            section: "trend".into(),
            key: "ma_period".into(),
            reason: "ma_period must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [trend] ma_period: ma_period must be at least 1"
        );
    }
}
