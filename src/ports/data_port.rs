//! Price data access port trait.

use crate::domain::error::RotatorError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::Symbol;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` within `[start_date, end_date]`, sorted by date.
    fn fetch_bars(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RotatorError>;

    fn list_symbols(&self) -> Result<Vec<Symbol>, RotatorError>;

    /// First date, last date and bar count, or `None` when there is no data.
    fn data_range(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError>;
}
