//! A symbol's readings for one trading day.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyObservation {
    pub close: f64,
    pub trend_reference: Option<f64>,
    pub momentum: Option<f64>,
}

impl DailyObservation {
    /// Both indicators have produced a value for this day.
    pub fn is_warm(&self) -> bool {
        self.trend_reference.is_some() && self.momentum.is_some()
    }

    /// Long-only trend gate: close strictly above the trend reference.
    /// Undefined reference never passes.
    pub fn passes_trend_gate(&self) -> bool {
        self.trend_reference
            .is_some_and(|reference| self.close > reference)
    }
}
