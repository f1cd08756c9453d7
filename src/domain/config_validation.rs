//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Defaults match the
//! ones used when the config is built, so omitted keys always pass.

use crate::domain::error::RotatorError;
use crate::domain::rebalancer::ZeroSharePolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_STARTING_CASH: f64 = 100_000.0;
pub const DEFAULT_HOLD_COUNT: i64 = 6;
pub const DEFAULT_TREND_WINDOW: i64 = 200;
pub const DEFAULT_MOMENTUM_WINDOW: i64 = 252;
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.98;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_starting_cash(config)?;
    validate_commission(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_positive_int(config, "hold_count", DEFAULT_HOLD_COUNT)?;
    validate_positive_int(config, "trend_window", DEFAULT_TREND_WINDOW)?;
    validate_positive_int(config, "momentum_window", DEFAULT_MOMENTUM_WINDOW)?;
    validate_safety_margin(config)?;
    validate_zero_share_policy(config)?;
    Ok(())
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let inline = config
        .get_string("universe", "symbols")
        .filter(|s| !s.trim().is_empty());
    let file = config
        .get_string("universe", "symbols_file")
        .filter(|s| !s.trim().is_empty());

    match (inline, file) {
        (Some(_), Some(_)) => Err(RotatorError::invalid(
            "universe",
            "symbols",
            "set either symbols or symbols_file, not both",
        )),
        (None, None) => Err(RotatorError::missing("universe", "symbols")),
        _ => Ok(()),
    }
}

fn validate_starting_cash(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "starting_cash", DEFAULT_STARTING_CASH);
    if !(value > 0.0 && value.is_finite()) {
        return Err(RotatorError::invalid(
            "backtest",
            "starting_cash",
            "starting_cash must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "commission_rate", 0.0);
    if !in_unit_interval(value) {
        return Err(RotatorError::invalid(
            "backtest",
            "commission_rate",
            "commission_rate must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !in_unit_interval(value) {
        return Err(RotatorError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

/// `[0, 1)`; false for NaN.
fn in_unit_interval(value: f64) -> bool {
    value >= 0.0 && value < 1.0
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(RotatorError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RotatorError> {
    match value {
        None => Err(RotatorError::missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            RotatorError::invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_positive_int(config: &dyn ConfigPort, key: &str, default: i64) -> Result<(), RotatorError> {
    let value = config.get_int("strategy", key, default);
    if value < 1 {
        return Err(RotatorError::invalid(
            "strategy",
            key,
            format!("{key} must be at least 1"),
        ));
    }
    Ok(())
}

fn validate_safety_margin(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("strategy", "safety_margin", DEFAULT_SAFETY_MARGIN);
    if !(value > 0.0 && value <= 1.0) {
        return Err(RotatorError::invalid(
            "strategy",
            "safety_margin",
            "safety_margin must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_zero_share_policy(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    if let Some(raw) = config.get_string("strategy", "zero_share_policy") {
        raw.parse::<ZeroSharePolicy>()
            .map_err(|reason| RotatorError::invalid("strategy", "zero_share_policy", reason))?;
    }
    Ok(())
}
