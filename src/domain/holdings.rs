//! Portfolio state: the positions the rebalancer believes it holds.
//!
//! Buys and sells are applied optimistically when the intent is issued.
//! Each change is remembered against its order id until the execution
//! collaborator reports a final status; a rejected or expired order rolls
//! the change back.

use std::collections::HashMap;

use super::order::{OrderEvent, OrderId, OrderStatus, Side};
use super::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldPosition {
    pub symbol: Symbol,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("sell for {0} which is not held")]
    NotHeld(Symbol),

    #[error("buy for {0} which is already held")]
    AlreadyHeld(Symbol),
}

#[derive(Debug, Clone, PartialEq)]
enum PendingChange {
    Bought(HeldPosition),
    Sold(HeldPosition),
}

/// What `reconcile` did with a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Non-final status, or a completion matching the optimistic change.
    Unchanged,
    /// Buy completed with a different size than requested.
    Resized { symbol: Symbol, from: u64, to: u64 },
    /// Buy rejected or expired; the optimistic position was dropped.
    BuyRolledBack(HeldPosition),
    /// Sell rejected or expired; the position is held again.
    SellRolledBack(HeldPosition),
    /// Failed sell whose symbol was bought again in the meantime.
    SellRollbackSkipped(HeldPosition),
    /// Notification for an order this tracker never issued or already settled.
    Untracked,
}

#[derive(Debug, Clone, Default)]
pub struct Holdings {
    positions: Vec<HeldPosition>,
    pending: HashMap<OrderId, PendingChange>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positions in insertion order.
    pub fn positions(&self) -> &[HeldPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&HeldPosition> {
        self.positions.iter().find(|p| &p.symbol == symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.get(symbol).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn apply_buy(&mut self, symbol: &Symbol, shares: u64) -> Result<(), PortfolioError> {
        if self.contains(symbol) {
            return Err(PortfolioError::AlreadyHeld(symbol.clone()));
        }
        self.positions.push(HeldPosition {
            symbol: symbol.clone(),
            shares,
        });
        Ok(())
    }

    pub fn apply_sell(&mut self, symbol: &Symbol) -> Result<HeldPosition, PortfolioError> {
        let idx = self
            .positions
            .iter()
            .position(|p| &p.symbol == symbol)
            .ok_or_else(|| PortfolioError::NotHeld(symbol.clone()))?;
        Ok(self.positions.remove(idx))
    }

    /// Remember the optimistic change behind `order` until it settles.
    pub fn track(&mut self, order: OrderId, side: Side, position: HeldPosition) {
        let change = match side {
            Side::Buy => PendingChange::Bought(position),
            Side::Sell => PendingChange::Sold(position),
        };
        self.pending.insert(order, change);
    }

    pub fn reconcile(&mut self, event: &OrderEvent) -> Reconciliation {
        if !event.status.is_final() {
            return Reconciliation::Unchanged;
        }
        let Some(change) = self.pending.remove(&event.id) else {
            return Reconciliation::Untracked;
        };

        match (change, event.status) {
            (PendingChange::Bought(requested), OrderStatus::Completed) => {
                let filled = event.fill.map(|f| f.size).unwrap_or(requested.shares);
                match self
                    .positions
                    .iter_mut()
                    .find(|p| p.symbol == requested.symbol)
                {
                    Some(held) if held.shares != filled => {
                        let from = held.shares;
                        held.shares = filled;
                        Reconciliation::Resized {
                            symbol: requested.symbol,
                            from,
                            to: filled,
                        }
                    }
                    _ => Reconciliation::Unchanged,
                }
            }
            (PendingChange::Sold(_), OrderStatus::Completed) => Reconciliation::Unchanged,
            (PendingChange::Bought(requested), _) => {
                match self.apply_sell(&requested.symbol) {
                    Ok(dropped) => Reconciliation::BuyRolledBack(dropped),
                    Err(_) => Reconciliation::Unchanged,
                }
            }
            (PendingChange::Sold(sold), _) => {
                if self.contains(&sold.symbol) {
                    Reconciliation::SellRollbackSkipped(sold)
                } else {
                    self.positions.push(sold.clone());
                    Reconciliation::SellRolledBack(sold)
                }
            }
        }
    }
}
