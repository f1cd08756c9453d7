//! Monthly rebalancing state machine.
//!
//! Driven once per trading day. On the first day of a new calendar month
//! with warm indicators it ranks the universe, sells holdings that fell out
//! of the top K and spends the reported cash on the open slots.
//!
//! Idle -> Evaluating -> Selling -> Buying -> Idle

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use super::cash::CashTracker;
use super::error::RotatorError;
use super::holdings::{HeldPosition, Holdings, PortfolioError, Reconciliation};
use super::order::{OrderEvent, OrderId, OrderStatus, Side};
use super::ranker::rank_top;
use super::scorer::{score_candidates, MomentumCandidate};
use super::symbol::Symbol;
use super::universe::Universe;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::signal_port::SignalProvider;

/// What to do when the per-slot budget cannot buy a single share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroSharePolicy {
    /// Leave the slot open and try the next target.
    #[default]
    SkipCandidate,
    /// Spend the slot anyway; nothing is bought for it this cycle.
    ConsumeSlot,
}

impl std::str::FromStr for ZeroSharePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(ZeroSharePolicy::SkipCandidate),
            "consume" => Ok(ZeroSharePolicy::ConsumeSlot),
            other => Err(format!("unknown zero share policy '{other}' (expected skip or consume)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    pub hold_count: usize,
    pub safety_margin: f64,
    pub zero_share_policy: ZeroSharePolicy,
    /// Symbol whose indicators gate the whole cycle. Defaults to the first
    /// symbol of the universe.
    pub reference_symbol: Option<Symbol>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            hold_count: 6,
            safety_margin: 0.98,
            zero_share_policy: ZeroSharePolicy::default(),
            reference_symbol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Evaluating,
    Selling,
    Buying,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub order: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub date: NaiveDate,
    pub targets: Vec<Symbol>,
    pub sells: Vec<Intent>,
    pub buys: Vec<Intent>,
    /// Targets the budget could not afford a single share of.
    pub zero_share: Vec<Symbol>,
    /// `None` when no slot was open after the sells.
    pub budget_per_slot: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Month already processed.
    SameMonth,
    /// Reference indicators not defined yet; the month stays unprocessed.
    WarmupIncomplete,
    Rebalanced(CycleReport),
}

pub struct Rebalancer {
    universe: Universe,
    config: RebalanceConfig,
    reference: Symbol,
    holdings: Holdings,
    last_month: Option<(i32, u32)>,
    phase: Phase,
}

impl Rebalancer {
    pub fn new(universe: Universe, config: RebalanceConfig) -> Result<Self, RotatorError> {
        if config.hold_count == 0 {
            return Err(RotatorError::invalid(
                "strategy",
                "hold_count",
                "hold_count must be at least 1",
            ));
        }
        if !(config.safety_margin > 0.0 && config.safety_margin <= 1.0) {
            return Err(RotatorError::invalid(
                "strategy",
                "safety_margin",
                "safety_margin must be in (0, 1]",
            ));
        }
        let reference = match &config.reference_symbol {
            Some(symbol) if universe.contains(symbol) => symbol.clone(),
            Some(symbol) => {
                return Err(RotatorError::invalid(
                    "universe",
                    "reference_symbol",
                    format!("{symbol} is not part of the universe"),
                ));
            }
            None => universe
                .first()
                .cloned()
                .ok_or(super::universe::UniverseError::Empty)?,
        };

        Ok(Rebalancer {
            universe,
            config,
            reference,
            holdings: Holdings::new(),
            last_month: None,
            phase: Phase::Idle,
        })
    }

    pub fn holdings(&self) -> &Holdings {
        &self.holdings
    }

    pub fn last_month(&self) -> Option<(i32, u32)> {
        self.last_month
    }

    pub fn reference_symbol(&self) -> &Symbol {
        &self.reference
    }

    /// Run one trading day. Errors are invariant violations in the
    /// portfolio state and should stop the run.
    pub fn on_day(
        &mut self,
        date: NaiveDate,
        signals: &dyn SignalProvider,
        broker: &mut dyn ExecutionPort,
        cash: &CashTracker,
    ) -> Result<CycleOutcome, PortfolioError> {
        let month = (date.year(), date.month());
        if self.last_month == Some(month) {
            return Ok(CycleOutcome::SameMonth);
        }

        self.enter(date, Phase::Evaluating);
        let warm = signals
            .observation(&self.reference, date)
            .is_some_and(|obs| obs.is_warm());
        if !warm {
            debug!(%date, reference = %self.reference, "indicators warming up, skipping");
            self.enter(date, Phase::Idle);
            return Ok(CycleOutcome::WarmupIncomplete);
        }

        self.last_month = Some(month);
        info!(
            %date,
            cash = cash.cash(),
            value = cash.total_value(),
            "first trading day of the month, rebalancing"
        );

        let targets = rank_top(
            score_candidates(&self.universe, signals, date),
            self.config.hold_count,
        );
        info!("held: {}", format_held(self.holdings.positions()));
        info!("most momentous: {}", format_targets(&targets));

        self.enter(date, Phase::Selling);
        let sells = self.sell_dropped(&targets, broker)?;

        self.enter(date, Phase::Buying);
        let (buys, zero_share, budget_per_slot) = self.buy_open_slots(&targets, broker, cash)?;

        debug_assert!(self.holdings.len() <= self.config.hold_count);
        self.enter(date, Phase::Idle);

        Ok(CycleOutcome::Rebalanced(CycleReport {
            date,
            targets: targets.into_iter().map(|c| c.symbol).collect(),
            sells,
            buys,
            zero_share,
            budget_per_slot,
        }))
    }

    fn enter(&mut self, date: NaiveDate, next: Phase) {
        debug!(%date, from = ?self.phase, to = ?next, "phase");
        self.phase = next;
    }

    fn sell_dropped(
        &mut self,
        targets: &[MomentumCandidate],
        broker: &mut dyn ExecutionPort,
    ) -> Result<Vec<Intent>, PortfolioError> {
        let dropped: Vec<Symbol> = self
            .holdings
            .positions()
            .iter()
            .filter(|p| !targets.iter().any(|c| c.symbol == p.symbol))
            .map(|p| p.symbol.clone())
            .collect();

        let mut intents = Vec::with_capacity(dropped.len());
        for symbol in dropped {
            let position = self.holdings.apply_sell(&symbol)?;
            info!(
                "{} no longer in top {} (holding {})",
                symbol, self.config.hold_count, position.shares
            );
            if position.shares == 0 {
                continue;
            }
            let order = broker.submit_order(&symbol, Side::Sell, position.shares);
            info!("selling {} of {} ({})", position.shares, symbol, order);
            intents.push(Intent {
                order,
                symbol,
                side: Side::Sell,
                size: position.shares,
            });
            self.holdings.track(order, Side::Sell, position);
        }
        Ok(intents)
    }

    fn buy_open_slots(
        &mut self,
        targets: &[MomentumCandidate],
        broker: &mut dyn ExecutionPort,
        cash: &CashTracker,
    ) -> Result<(Vec<Intent>, Vec<Symbol>, Option<f64>), PortfolioError> {
        let mut slots = self.config.hold_count.saturating_sub(self.holdings.len());
        if slots == 0 {
            return Ok((Vec::new(), Vec::new(), None));
        }

        let budget = budget_per_slot(cash.cash(), slots, self.config.safety_margin);
        let mut intents = Vec::new();
        let mut zero_share = Vec::new();

        for candidate in targets {
            if slots == 0 {
                break;
            }
            if self.holdings.contains(&candidate.symbol) {
                continue;
            }

            let shares = shares_for_budget(budget, candidate.close);
            if shares == 0 {
                warn!(
                    "cannot afford {} (budget={:.2}, price={:.2})",
                    candidate.symbol, budget, candidate.close
                );
                zero_share.push(candidate.symbol.clone());
                if self.config.zero_share_policy == ZeroSharePolicy::ConsumeSlot {
                    slots -= 1;
                }
                continue;
            }

            self.holdings.apply_buy(&candidate.symbol, shares)?;
            let order = broker.submit_order(&candidate.symbol, Side::Buy, shares);
            info!(
                "buying {}, budget={:.2}, price={:.2}, size={} ({})",
                candidate.symbol, budget, candidate.close, shares, order
            );
            self.holdings.track(
                order,
                Side::Buy,
                HeldPosition {
                    symbol: candidate.symbol.clone(),
                    shares,
                },
            );
            intents.push(Intent {
                order,
                symbol: candidate.symbol.clone(),
                side: Side::Buy,
                size: shares,
            });
            slots -= 1;
        }

        Ok((intents, zero_share, Some(budget)))
    }

    /// Feed an execution notification back into the portfolio state.
    pub fn on_order_event(&mut self, event: &OrderEvent) -> Reconciliation {
        match (event.status, event.fill) {
            (OrderStatus::Completed, Some(fill)) => info!(
                "{} EXECUTED {}, price={:.2}, size={}, cost={:.2}, comm={:.2}",
                event.side, event.symbol, fill.price, fill.size, fill.cost, fill.commission
            ),
            (status, _) if status.is_failure() => warn!(
                "{} {} {:?}",
                event.side, event.symbol, event.status
            ),
            _ => debug!("{} {} {} {:?}", event.id, event.side, event.symbol, event.status),
        }

        let outcome = self.holdings.reconcile(event);
        match &outcome {
            Reconciliation::BuyRolledBack(p) => {
                warn!("rolled back buy of {} {}", p.shares, p.symbol)
            }
            Reconciliation::SellRolledBack(p) => {
                warn!("sell failed, holding {} {} again", p.shares, p.symbol)
            }
            Reconciliation::SellRollbackSkipped(p) => warn!(
                "sell of {} {} failed but the symbol was bought again",
                p.shares, p.symbol
            ),
            Reconciliation::Resized { symbol, from, to } => {
                info!("{} filled {} instead of {}", symbol, to, from)
            }
            Reconciliation::Unchanged | Reconciliation::Untracked => {}
        }
        outcome
    }
}

/// `(cash / slots) * safety_margin`.
pub fn budget_per_slot(cash: f64, slots: usize, safety_margin: f64) -> f64 {
    if slots == 0 {
        return 0.0;
    }
    (cash / slots as f64) * safety_margin
}

/// Whole shares affordable at `price`; zero for non-positive inputs.
pub fn shares_for_budget(budget: f64, price: f64) -> u64 {
    if !(budget > 0.0 && price > 0.0) {
        return 0;
    }
    let shares = (budget / price).floor();
    if shares.is_finite() { shares as u64 } else { 0 }
}

fn format_held(positions: &[HeldPosition]) -> String {
    positions
        .iter()
        .map(|p| format!("({},{})", p.symbol, p.shares))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_targets(targets: &[MomentumCandidate]) -> String {
    targets
        .iter()
        .map(|c| c.symbol.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
