//! Domain error types.

use crate::domain::holdings::PortfolioError;
use crate::domain::universe::UniverseError;

/// Top-level error type for rotator.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
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

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("portfolio invariant violated: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RotatorError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RotatorError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        RotatorError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&RotatorError> for std::process::ExitCode {
    fn from(err: &RotatorError) -> Self {
        let code: u8 = match err {
            RotatorError::Io(_) => 1,
            RotatorError::ConfigParse { .. }
            | RotatorError::ConfigMissing { .. }
            | RotatorError::ConfigInvalid { .. } => 2,
            RotatorError::Data { .. } => 3,
            RotatorError::Universe(_) => 4,
            RotatorError::NoData { .. } | RotatorError::InsufficientData { .. } => 5,
            RotatorError::Portfolio(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::Symbol;
    use std::process::ExitCode;

    #[test]
    fn config_errors_display_section_and_key() {
        let err = RotatorError::invalid("strategy", "hold_count", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid config value [strategy] hold_count: must be at least 1"
        );
        let err = RotatorError::missing("backtest", "start_date");
        assert_eq!(err.to_string(), "missing config key [backtest] start_date");
    }

    #[test]
    fn portfolio_error_converts() {
        let err: RotatorError = PortfolioError::NotHeld(Symbol::new("AAPL")).into();
        assert!(matches!(err, RotatorError::Portfolio(_)));
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(
            ExitCode::from(&RotatorError::missing("a", "b")),
            ExitCode::from(2)
        );
        assert_eq!(
            ExitCode::from(&RotatorError::Data { reason: "x".into() }),
            ExitCode::from(3)
        );
        assert_eq!(
            ExitCode::from(&RotatorError::Universe(UniverseError::Empty)),
            ExitCode::from(4)
        );
        assert_eq!(
            ExitCode::from(&RotatorError::Portfolio(PortfolioError::AlreadyHeld(
                Symbol::new("MSFT")
            ))),
            ExitCode::from(6)
        );
    }
}
