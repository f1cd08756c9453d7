#![allow(dead_code)]

use chrono::NaiveDate;
use rotator::domain::error::RotatorError;
use rotator::domain::observation::DailyObservation;
pub use rotator::domain::ohlcv::OhlcvBar;
use rotator::domain::order::{Fill, OrderEvent, OrderId, OrderStatus, Side};
pub use rotator::domain::symbol::Symbol;
use rotator::domain::universe::Universe;
use rotator::ports::data_port::DataPort;
use rotator::ports::execution_port::ExecutionPort;
use rotator::ports::signal_port::SignalProvider;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<Symbol, Vec<OhlcvBar>>,
    pub errors: HashMap<Symbol, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(Symbol::new(symbol), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(Symbol::new(symbol), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &Symbol,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RotatorError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RotatorError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<Symbol>, RotatorError> {
        let mut symbols: Vec<Symbol> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Execution port that only records what it was asked to do.
#[derive(Default)]
pub struct RecordingBroker {
    pub orders: Vec<(OrderId, Symbol, Side, u64)>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sides(&self) -> Vec<(String, Side)> {
        self.orders
            .iter()
            .map(|(_, symbol, side, _)| (symbol.to_string(), *side))
            .collect()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Notification for a recorded order with the given final status.
    pub fn event(&self, index: usize, status: OrderStatus) -> OrderEvent {
        let (id, symbol, side, size) = self.orders[index].clone();
        OrderEvent {
            id,
            symbol,
            side,
            status,
            fill: (status == OrderStatus::Completed).then_some(Fill {
                price: 100.0,
                size,
                cost: 100.0 * size as f64,
                commission: 0.0,
            }),
        }
    }
}

impl ExecutionPort for RecordingBroker {
    fn submit_order(&mut self, symbol: &Symbol, side: Side, size: u64) -> OrderId {
        let id = OrderId(self.orders.len() as u64 + 1);
        self.orders.push((id, symbol.clone(), side, size));
        id
    }
}

/// Fixed observations per symbol, the same on every date.
#[derive(Default)]
pub struct StaticSignals {
    pub observations: HashMap<Symbol, DailyObservation>,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warm symbol passing the trend gate, priced at `close`.
    pub fn with(mut self, symbol: &str, close: f64, momentum: f64) -> Self {
        self.set(symbol, close, Some(close * 0.9), Some(momentum));
        self
    }

    pub fn set(&mut self, symbol: &str, close: f64, trend: Option<f64>, momentum: Option<f64>) {
        self.observations.insert(
            Symbol::new(symbol),
            DailyObservation {
                close,
                trend_reference: trend,
                momentum,
            },
        );
    }
}

impl SignalProvider for StaticSignals {
    fn observation(&self, symbol: &Symbol, _date: NaiveDate) -> Option<DailyObservation> {
        self.observations.get(symbol).copied()
    }
}

pub fn universe(symbols: &[&str]) -> Universe {
    Universe::new(symbols.iter().map(|s| Symbol::new(s)).collect()).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: Symbol::new(symbol),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// Daily bars with the close moving by `step` each day.
pub fn generate_bars(
    symbol: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            OhlcvBar {
                symbol: Symbol::new(symbol),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
