//! Per-identifier traffic statistics and bus-load estimation
//!
//! The aggregator is fed one frame at a time and keeps O(1) state per
//! identifier, so arbitrarily long traces can be analysed in one pass.

pub mod aggregator;
pub mod bus_load;

pub use aggregator::{IdentifierStats, IdentifierSummary, StatisticsAggregator};
pub use bus_load::{compute_load, BusLoad};
