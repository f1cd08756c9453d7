//! Indicator series feeding the signal provider.
//!
//! - `IndicatorPoint`: one dated value plus a warm-up flag
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series aligned 1:1 with the source bars

pub mod roc;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Roc(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar `index`, or `None` while the indicator is still warming up.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl IndicatorType {
    /// Number of bars needed before the first valid value.
    pub fn warmup_bars(&self) -> usize {
        match self {
            IndicatorType::Sma(period) => period.saturating_sub(1),
            IndicatorType::Roc(period) => *period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, valid: bool, value: f64) -> IndicatorPoint {
        IndicatorPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            valid,
            value,
        }
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(200).to_string(), "SMA(200)");
        assert_eq!(IndicatorType::Roc(252).to_string(), "ROC(252)");
    }

    #[test]
    fn warmup_bars_per_type() {
        assert_eq!(IndicatorType::Sma(200).warmup_bars(), 199);
        assert_eq!(IndicatorType::Roc(252).warmup_bars(), 252);
        assert_eq!(IndicatorType::Sma(0).warmup_bars(), 0);
    }

    #[test]
    fn value_at_hides_warmup_points() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![point(1, false, 0.0), point(2, true, 10.5)],
        };
        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), Some(10.5));
        assert_eq!(series.value_at(2), None);
    }
}
