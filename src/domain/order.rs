//! Order intents and the execution notifications that answer them.

use std::fmt;

use super::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Rejected or expired: the optimistic change behind the order never happened.
    pub fn is_failure(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Expired)
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

/// Execution details reported on completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub size: u64,
    pub cost: f64,
    pub commission: f64,
}

/// Order lifecycle notification from the execution collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub status: OrderStatus,
    pub fill: Option<Fill>,
}
