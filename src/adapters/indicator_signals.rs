//! Signal provider backed by precomputed SMA/ROC series, keyed by symbol.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::observation::DailyObservation;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::{build_unified_timeline, SymbolSeries};
use crate::domain::symbol::Symbol;
use crate::ports::signal_port::{MarketData, SignalProvider};

#[derive(Debug, Clone, Default)]
pub struct IndicatorSignals {
    series: HashMap<Symbol, SymbolSeries>,
}

impl IndicatorSignals {
    pub fn new(series: impl IntoIterator<Item = SymbolSeries>) -> Self {
        Self {
            series: series.into_iter().map(|s| (s.symbol.clone(), s)).collect(),
        }
    }

    /// Compute the trend and momentum series for every symbol's bars.
    pub fn from_bars(
        bars: impl IntoIterator<Item = (Symbol, Vec<OhlcvBar>)>,
        trend_window: usize,
        momentum_window: usize,
    ) -> Self {
        Self::new(
            bars.into_iter()
                .map(|(symbol, bars)| SymbolSeries::new(symbol, bars, trend_window, momentum_window)),
        )
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SignalProvider for IndicatorSignals {
    fn observation(&self, symbol: &Symbol, date: NaiveDate) -> Option<DailyObservation> {
        self.series.get(symbol)?.observation(date)
    }
}

impl MarketData for IndicatorSignals {
    fn timeline(&self) -> Vec<NaiveDate> {
        build_unified_timeline(self.series.values())
    }

    fn bars_on(&self, date: NaiveDate) -> HashMap<Symbol, &OhlcvBar> {
        self.series
            .iter()
            .filter_map(|(symbol, s)| s.get_bar(date).map(|bar| (symbol.clone(), bar)))
            .collect()
    }
}
