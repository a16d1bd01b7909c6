//! Bus utilization estimate

use serde::Serialize;

/// Bus load over the whole observation window of a trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BusLoad {
    /// Estimated bits of all frames, across all identifiers
    pub total_bits: u64,
    /// Last overall timestamp minus first overall timestamp, in seconds
    pub duration_s: f64,
    /// Nominal bus bit rate in Mbit/s
    pub bus_rate_mbps: f64,
    /// Share of the theoretical bus capacity used, in percent
    pub load_percent: f64,
}

impl BusLoad {
    pub fn new(total_bits: u64, duration_s: f64, bus_rate_mbps: f64) -> Self {
        Self {
            total_bits,
            duration_s,
            bus_rate_mbps,
            load_percent: compute_load(total_bits, duration_s, bus_rate_mbps),
        }
    }
}

/// Percentage of the bus capacity consumed by `total_bits` over `duration_s`
///
/// A zero or negative window (single timestamp, empty trace) has no
/// measurable load and yields 0, as does a non-positive bit rate.
pub fn compute_load(total_bits: u64, duration_s: f64, bus_rate_mbps: f64) -> f64 {
    if duration_s <= 0.0 || bus_rate_mbps <= 0.0 {
        return 0.0;
    }

    let capacity_bits = bus_rate_mbps * 1e6 * duration_s;
    100.0 * total_bits as f64 / capacity_bits
}
