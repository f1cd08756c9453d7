//! Simulated order execution for backtests.
//!
//! Orders submitted during a day are filled on the next trading day at that
//! day's open, in submission order. Fills settle cash immediately, so sells
//! queued ahead of buys fund them. A queued order for a symbol that does not
//! trade on the fill day expires; a buy the cash cannot cover is rejected.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::ohlcv::OhlcvBar;
use super::order::{Fill, OrderEvent, OrderId, OrderStatus, Side};
use super::symbol::Symbol;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfig {
    pub starting_cash: f64,
    /// Fraction of traded value charged per fill.
    pub commission_rate: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            starting_cash: 100_000.0,
            commission_rate: 0.0,
        }
    }
}

/// A completed fill, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedTrade {
    pub date: NaiveDate,
    pub order: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub fill: Fill,
}

#[derive(Debug, Clone)]
struct QueuedOrder {
    id: OrderId,
    symbol: Symbol,
    side: Side,
    size: u64,
}

#[derive(Debug)]
pub struct SimulatedBroker {
    config: BrokerConfig,
    cash: f64,
    next_id: u64,
    queued: Vec<QueuedOrder>,
    positions: HashMap<Symbol, u64>,
    last_close: HashMap<Symbol, f64>,
    events: Vec<OrderEvent>,
    trades: Vec<ExecutedTrade>,
}

/// commission = value * rate
pub fn calculate_commission(trade_value: f64, commission_rate: f64) -> f64 {
    trade_value * commission_rate
}

impl SimulatedBroker {
    pub fn new(config: BrokerConfig) -> Self {
        SimulatedBroker {
            cash: config.starting_cash,
            config,
            next_id: 0,
            queued: Vec::new(),
            positions: HashMap::new(),
            last_close: HashMap::new(),
            events: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &Symbol) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    pub fn trades(&self) -> &[ExecutedTrade] {
        &self.trades
    }

    /// Fill every queued order against the day's bars.
    pub fn process_day(&mut self, date: NaiveDate, bars: &HashMap<Symbol, &OhlcvBar>) {
        for order in std::mem::take(&mut self.queued) {
            let Some(bar) = bars.get(&order.symbol) else {
                self.emit(&order, OrderStatus::Expired, None);
                continue;
            };

            let price = bar.fill_price();
            let value = order.size as f64 * price;
            let commission = calculate_commission(value, self.config.commission_rate);
            let fill = Fill {
                price,
                size: order.size,
                cost: value,
                commission,
            };

            let accepted = match order.side {
                Side::Buy => {
                    if order.size == 0 || value + commission > self.cash {
                        false
                    } else {
                        self.cash -= value + commission;
                        *self.positions.entry(order.symbol.clone()).or_insert(0) += order.size;
                        true
                    }
                }
                Side::Sell => {
                    let held = self.position(&order.symbol);
                    if order.size == 0 || order.size > held {
                        false
                    } else {
                        self.cash += value - commission;
                        if held == order.size {
                            self.positions.remove(&order.symbol);
                        } else {
                            self.positions.insert(order.symbol.clone(), held - order.size);
                        }
                        true
                    }
                }
            };

            if accepted {
                self.trades.push(ExecutedTrade {
                    date,
                    order: order.id,
                    symbol: order.symbol.clone(),
                    side: order.side,
                    fill,
                });
                self.emit(&order, OrderStatus::Completed, Some(fill));
            } else {
                self.emit(&order, OrderStatus::Rejected, None);
            }
        }
    }

    /// Remember closing prices for valuation.
    pub fn mark(&mut self, bars: &HashMap<Symbol, &OhlcvBar>) {
        for (symbol, bar) in bars {
            self.last_close.insert(symbol.clone(), bar.close);
        }
    }

    /// `(cash, total_value)` with positions at their last known close.
    pub fn cash_value(&self) -> (f64, f64) {
        let holdings: f64 = self
            .positions
            .iter()
            .map(|(symbol, &size)| {
                size as f64 * self.last_close.get(symbol).copied().unwrap_or(0.0)
            })
            .sum();
        (self.cash, self.cash + holdings)
    }

    /// Hand over every notification raised since the last call.
    pub fn drain_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, order: &QueuedOrder, status: OrderStatus, fill: Option<Fill>) {
        self.events.push(OrderEvent {
            id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            status,
            fill,
        });
    }
}

impl ExecutionPort for SimulatedBroker {
    fn submit_order(&mut self, symbol: &Symbol, side: Side, size: u64) -> OrderId {
        self.next_id += 1;
        let order = QueuedOrder {
            id: OrderId(self.next_id),
            symbol: symbol.clone(),
            side,
            size,
        };
        self.emit(&order, OrderStatus::Submitted, None);
        self.emit(&order, OrderStatus::Accepted, None);
        let id = order.id;
        self.queued.push(order);
        id
    }
}
