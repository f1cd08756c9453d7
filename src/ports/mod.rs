//! Port traits: the boundaries between the rebalancing core and its collaborators.

pub mod config_port;
pub mod data_port;
pub mod execution_port;
pub mod signal_port;
