//! Daily OHLCV bar representation.

use chrono::NaiveDate;

use super::symbol::Symbol;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Price used when a queued order fills on this bar. Falls back to the
    /// close when the source carries no open (zero or missing).
    pub fn fill_price(&self) -> f64 {
        if self.open > 0.0 { self.open } else { self.close }
    }
}
