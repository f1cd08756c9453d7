//! The fixed, ordered symbol universe.
//!
//! Parses symbol lists from configuration, drops excluded tickers and
//! validates that each remaining symbol has enough data to trade. The
//! resulting [`Universe`] is immutable for the rest of the run; its order is
//! only used to break momentum ties deterministically.

use crate::domain::error::RotatorError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::symbol::Symbol;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    symbols: Vec<Symbol>,
    index: HashMap<Symbol, usize>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("universe is empty")]
    Empty,
}

impl Universe {
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, UniverseError> {
        if symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.clone(), i).is_some() {
                return Err(UniverseError::DuplicateSymbol(symbol.to_string()));
            }
        }
        Ok(Universe { symbols, index })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.index.contains_key(symbol)
    }

    /// Position of `symbol` in the configured order.
    pub fn index_of(&self, symbol: &Symbol) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    pub fn first(&self) -> Option<&Symbol> {
        self.symbols.first()
    }
}

/// Split a comma-separated list into symbols, preserving order.
pub fn parse_symbols(input: &str) -> Result<Vec<Symbol>, UniverseError> {
    collect_symbols(input.split(','), true)
}

/// One ticker per line; blank lines and `#` comments are ignored.
pub fn parse_symbol_lines(input: &str) -> Result<Vec<Symbol>, UniverseError> {
    let lines = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    collect_symbols(lines, false)
}

fn collect_symbols<'a>(
    tokens: impl Iterator<Item = &'a str>,
    reject_empty: bool,
) -> Result<Vec<Symbol>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            if reject_empty {
                return Err(UniverseError::EmptyToken);
            }
            continue;
        }
        let symbol = Symbol::new(trimmed);
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol.to_string()));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Remove every symbol listed in `excluded`, keeping the order of the rest.
pub fn apply_exclusions(symbols: Vec<Symbol>, excluded: &[Symbol]) -> Vec<Symbol> {
    if excluded.is_empty() {
        return symbols;
    }
    let excluded: HashSet<&Symbol> = excluded.iter().collect();
    symbols
        .into_iter()
        .filter(|s| !excluded.contains(s))
        .collect()
}

pub struct UniverseValidationResult {
    pub universe: Universe,
    /// Bars of every kept symbol, in universe order.
    pub bars: Vec<(Symbol, Vec<OhlcvBar>)>,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: Symbol,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

/// Fetch every symbol's bars and keep the symbols with at least `min_bars`
/// of them in the backtest window.
pub fn validate_universe(
    data_port: &dyn DataPort,
    symbols: Vec<Symbol>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<UniverseValidationResult, RotatorError> {
    let total = symbols.len();
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match data_port.fetch_bars(&symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(%symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(%symbol, "skipping symbol (no data found)");
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < min_bars {
            warn!(
                %symbol,
                bars = bars.len(),
                minimum = min_bars,
                "skipping symbol (not enough bars)"
            );
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        valid.push((symbol, bars));
    }

    if valid.is_empty() {
        return Err(RotatorError::InsufficientData {
            symbol: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        info!("trading {} of {} symbols", valid.len(), total);
    }

    let universe = Universe::new(valid.iter().map(|(s, _)| s.clone()).collect())?;
    Ok(UniverseValidationResult {
        universe,
        bars: valid,
        skipped,
    })
}
