//! Backtest engine and event loop.
//!
//! Replays the unified timeline one trading day at a time:
//! fill queued orders at the open, reconcile their notifications, mark the
//! account at the close and hand the day to the rebalancer.

use chrono::NaiveDate;
use tracing::info;

use super::cash::CashTracker;
use super::error::RotatorError;
use super::execution::{BrokerConfig, ExecutedTrade, SimulatedBroker};
use super::holdings::{HeldPosition, Reconciliation};
use super::indicator::IndicatorType;
use super::metrics::EquityPoint;
use super::rebalancer::{CycleOutcome, CycleReport, RebalanceConfig, Rebalancer};
use super::universe::Universe;
use crate::ports::signal_port::MarketData;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starting_cash: f64,
    pub commission_rate: f64,
    pub risk_free_rate: f64,
    pub trend_window: usize,
    pub momentum_window: usize,
    pub rebalance: RebalanceConfig,
}

impl BacktestConfig {
    /// Bars a symbol needs before its trend and momentum are both defined.
    pub fn required_bars(&self) -> usize {
        let trend = IndicatorType::Sma(self.trend_window).warmup_bars();
        let momentum = IndicatorType::Roc(self.momentum_window).warmup_bars();
        trend.max(momentum) + 1
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<ExecutedTrade>,
    pub cycles: Vec<CycleReport>,
    pub final_holdings: Vec<HeldPosition>,
    pub final_cash: f64,
    pub final_value: f64,
    /// Optimistic changes undone after a rejected or expired order.
    pub rollbacks: usize,
    /// Orders submitted on the last day that never reached a fill day.
    pub open_orders: usize,
}

pub fn run_backtest<M: MarketData>(
    universe: Universe,
    market: &M,
    config: &BacktestConfig,
) -> Result<BacktestResult, RotatorError> {
    let mut rebalancer = Rebalancer::new(universe, config.rebalance.clone())?;
    let mut broker = SimulatedBroker::new(BrokerConfig {
        starting_cash: config.starting_cash,
        commission_rate: config.commission_rate,
    });
    let mut cash = CashTracker::new(config.starting_cash);

    let timeline: Vec<NaiveDate> = market
        .timeline()
        .into_iter()
        .filter(|d| *d >= config.start_date && *d <= config.end_date)
        .collect();

    info!(
        days = timeline.len(),
        reference = %rebalancer.reference_symbol(),
        "starting backtest"
    );

    let mut equity_curve = Vec::with_capacity(timeline.len());
    let mut cycles = Vec::new();
    let mut rollbacks = 0usize;

    for &date in &timeline {
        let bars = market.bars_on(date);

        broker.process_day(date, &bars);
        for event in broker.drain_events() {
            match rebalancer.on_order_event(&event) {
                Reconciliation::BuyRolledBack(_) | Reconciliation::SellRolledBack(_) => {
                    rollbacks += 1
                }
                _ => {}
            }
        }

        broker.mark(&bars);
        let (broker_cash, value) = broker.cash_value();
        cash.on_cash_value(broker_cash, value);
        equity_curve.push(EquityPoint {
            date,
            cash: broker_cash,
            equity: value,
        });

        if let CycleOutcome::Rebalanced(report) =
            rebalancer.on_day(date, market, &mut broker, &cash)?
        {
            cycles.push(report);
        }
    }

    let (final_cash, final_value) = broker.cash_value();
    let result = BacktestResult {
        equity_curve,
        fills: broker.trades().to_vec(),
        cycles,
        final_holdings: rebalancer.holdings().positions().to_vec(),
        final_cash,
        final_value,
        rollbacks,
        open_orders: broker.queued_count(),
    };

    info!(
        cycles = result.cycles.len(),
        fills = result.fills.len(),
        final_value = result.final_value,
        "backtest finished"
    );
    Ok(result)
}
