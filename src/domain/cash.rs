//! Broker-reported cash and account value.
//!
//! The figure is only ever replaced by a cash/value notification; nothing in
//! the engine derives it from its own orders. Between a cycle's intents and
//! their fills the figure is stale, and sizing tolerates that.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashTracker {
    cash: f64,
    total_value: f64,
}

impl CashTracker {
    /// Seeded with the configured starting cash until the first notification.
    pub fn new(starting_cash: f64) -> Self {
        CashTracker {
            cash: starting_cash,
            total_value: starting_cash,
        }
    }

    pub fn on_cash_value(&mut self, cash: f64, total_value: f64) {
        self.cash = cash;
        self.total_value = total_value;
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn total_value(&self) -> f64 {
        self.total_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_starting_cash() {
        let tracker = CashTracker::new(100_000.0);
        assert_eq!(tracker.cash(), 100_000.0);
        assert_eq!(tracker.total_value(), 100_000.0);
    }

    #[test]
    fn notification_replaces_figures() {
        let mut tracker = CashTracker::new(100_000.0);
        tracker.on_cash_value(2_500.0, 101_250.0);
        assert_eq!(tracker.cash(), 2_500.0);
        assert_eq!(tracker.total_value(), 101_250.0);

        tracker.on_cash_value(-10.0, 99_000.0);
        assert_eq!(tracker.cash(), -10.0);
    }
}
