//! Core domain types and logic.

pub mod symbol;
pub mod ohlcv;
pub mod universe;
pub mod indicator;
pub mod observation;
pub mod series;
pub mod scorer;
pub mod ranker;
pub mod order;
pub mod holdings;
pub mod cash;
pub mod execution;
pub mod rebalancer;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
