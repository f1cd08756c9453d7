//! Signal provider port: per-symbol, per-day indicator readings.

use crate::domain::observation::DailyObservation;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::Symbol;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Read-only source of daily observations.
///
/// Returns `None` when the symbol did not trade on `date`. Indicator values
/// still warming up are reported as `None` fields inside the observation.
pub trait SignalProvider {
    fn observation(&self, symbol: &Symbol, date: NaiveDate) -> Option<DailyObservation>;
}

/// Replayable market: the trading calendar and the bars of each day.
pub trait MarketData: SignalProvider {
    /// Every date on which at least one symbol traded, ascending.
    fn timeline(&self) -> Vec<NaiveDate>;

    /// Bars of the symbols that traded on `date`.
    fn bars_on(&self, date: NaiveDate) -> HashMap<Symbol, &OhlcvBar>;
}
