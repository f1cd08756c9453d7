//! Per-symbol bar history with its indicator series, and the unified timeline.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::roc::calculate_roc;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::observation::DailyObservation;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::Symbol;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: Symbol,
    pub bars: Vec<OhlcvBar>,
    pub trend: IndicatorSeries,
    pub momentum: IndicatorSeries,
    date_index: HashMap<NaiveDate, usize>,
}

impl SymbolSeries {
    /// `bars` must be sorted by date.
    pub fn new(
        symbol: Symbol,
        bars: Vec<OhlcvBar>,
        trend_window: usize,
        momentum_window: usize,
    ) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        let trend = calculate_sma(&bars, trend_window);
        let momentum = calculate_roc(&bars, momentum_window);
        Self {
            symbol,
            bars,
            trend,
            momentum,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn observation(&self, date: NaiveDate) -> Option<DailyObservation> {
        let i = *self.date_index.get(&date)?;
        Some(DailyObservation {
            close: self.bars[i].close,
            trend_reference: self.trend.value_at(i),
            momentum: self.momentum.value_at(i),
        })
    }
}

pub fn build_unified_timeline<'a>(series: impl IntoIterator<Item = &'a SymbolSeries>) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .into_iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
