//! Trend-filtered momentum scoring.
//!
//! A symbol becomes a candidate for the day only when both indicators are
//! defined and its close is above the trend reference. The candidate carries
//! the symbol's universe position so the ranker can break ties without
//! looking anything up again.

use chrono::NaiveDate;

use crate::domain::symbol::Symbol;
use crate::domain::universe::Universe;
use crate::ports::signal_port::SignalProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumCandidate {
    pub symbol: Symbol,
    pub momentum: f64,
    pub close: f64,
    pub universe_index: usize,
}

/// Build the day's candidate set in universe order.
pub fn score_candidates(
    universe: &Universe,
    signals: &dyn SignalProvider,
    date: NaiveDate,
) -> Vec<MomentumCandidate> {
    universe
        .symbols()
        .iter()
        .enumerate()
        .filter_map(|(universe_index, symbol)| {
            let obs = signals.observation(symbol, date)?;
            if !obs.is_warm() || !obs.passes_trend_gate() {
                return None;
            }
            let momentum = obs.momentum.filter(|m| m.is_finite())?;
            Some(MomentumCandidate {
                symbol: symbol.clone(),
                momentum,
                close: obs.close,
                universe_index,
            })
        })
        .collect()
}
