//! Execution port: where buy and sell intents go.

use crate::domain::order::{OrderId, Side};
use crate::domain::symbol::Symbol;

/// Accepts order intents. Fire-and-forget: the outcome arrives later as
/// [`OrderEvent`](crate::domain::order::OrderEvent) notifications.
pub trait ExecutionPort {
    fn submit_order(&mut self, symbol: &Symbol, side: Side, size: u64) -> OrderId;
}
