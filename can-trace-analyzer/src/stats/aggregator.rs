//! Streaming per-identifier aggregation
//!
//! Inter-arrival deltas are not retained. Each identifier keeps the delta
//! sum (for the average rate) and Welford's running mean / M2 (for the
//! sample variance), which is numerically stable and needs constant memory.

use super::bus_load::BusLoad;
use crate::types::Frame;
use serde::Serialize;
use std::collections::BTreeMap;

/// Running statistics for one CAN identifier
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierStats {
    /// CAN message ID
    pub can_id: u32,
    /// Number of frames seen
    pub count: u64,
    /// Timestamp of the first frame seen
    pub first_timestamp: f64,
    /// Timestamp of the most recently seen frame (file order)
    pub last_timestamp: f64,
    /// Sum of the estimated wire bits of all frames
    pub total_bits: u64,
    delta_sum: f64,
    delta_mean: f64,
    delta_m2: f64,
}

impl IdentifierStats {
    fn new(frame: &Frame) -> Self {
        Self {
            can_id: frame.can_id,
            count: 1,
            first_timestamp: frame.timestamp,
            last_timestamp: frame.timestamp,
            total_bits: u64::from(frame.wire_bits()),
            delta_sum: 0.0,
            delta_mean: 0.0,
            delta_m2: 0.0,
        }
    }

    /// Fold a later frame of the same identifier; returns the inter-arrival delta
    fn record(&mut self, frame: &Frame) -> f64 {
        let delta = frame.timestamp - self.last_timestamp;

        self.count += 1;
        let n = self.delta_count() as f64;
        let deviation = delta - self.delta_mean;
        self.delta_mean += deviation / n;
        self.delta_m2 += deviation * (delta - self.delta_mean);
        self.delta_sum += delta;

        self.last_timestamp = frame.timestamp;
        self.total_bits += u64::from(frame.wire_bits());
        delta
    }

    /// Number of inter-arrival deltas observed (always `count - 1`)
    pub fn delta_count(&self) -> u64 {
        self.count - 1
    }

    /// Sum of all inter-arrival deltas in seconds
    pub fn delta_sum(&self) -> f64 {
        self.delta_sum
    }

    /// Average message rate in Hz; 0 for a single observation or an empty span
    pub fn average_rate_hz(&self) -> f64 {
        if self.count > 1 && self.delta_sum > 0.0 {
            self.delta_count() as f64 / self.delta_sum
        } else {
            0.0
        }
    }

    /// Sample (Bessel-corrected) standard deviation of the inter-arrival
    /// deltas in seconds; 0 with fewer than two deltas
    pub fn jitter_std_dev(&self) -> f64 {
        let n = self.delta_count();
        if n < 2 {
            return 0.0;
        }
        (self.delta_m2 / (n - 1) as f64).max(0.0).sqrt()
    }

    /// True when enough deltas exist for a meaningful jitter figure
    pub fn has_jitter(&self) -> bool {
        self.delta_count() >= 2
    }

    /// Derived figures for reporting
    pub fn summary(&self) -> IdentifierSummary {
        IdentifierSummary {
            can_id: self.can_id,
            count: self.count,
            average_rate_hz: self.average_rate_hz(),
            jitter_std_dev_s: self.jitter_std_dev(),
            jitter_samples: self.delta_count(),
            total_bits: self.total_bits,
        }
    }
}

/// Final per-identifier figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IdentifierSummary {
    pub can_id: u32,
    pub count: u64,
    pub average_rate_hz: f64,
    pub jitter_std_dev_s: f64,
    /// Number of inter-arrival deltas behind the jitter figure
    pub jitter_samples: u64,
    pub total_bits: u64,
}

/// Aggregates frames of one analysis run
///
/// Owned by the caller for exactly one run; there is no shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsAggregator {
    ids: BTreeMap<u32, IdentifierStats>,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    frame_count: u64,
    negative_deltas: u64,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed frame, in file order
    pub fn update(&mut self, frame: &Frame) {
        self.frame_count += 1;
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(frame.timestamp);
        }
        self.last_timestamp = Some(frame.timestamp);

        match self.ids.get_mut(&frame.can_id) {
            Some(stats) => {
                let delta = stats.record(frame);
                if delta < 0.0 {
                    // kept as-is: it feeds into the jitter figure
                    self.negative_deltas += 1;
                    log::debug!(
                        "Non-monotonic timestamp for ID 0x{:X}: delta {:.6} s",
                        frame.can_id,
                        delta
                    );
                }
            }
            None => {
                self.ids.insert(frame.can_id, IdentifierStats::new(frame));
            }
        }
    }

    /// Statistics for one identifier
    pub fn get(&self, can_id: u32) -> Option<&IdentifierStats> {
        self.ids.get(&can_id)
    }

    /// All identifiers in ascending numeric order
    pub fn iter(&self) -> impl Iterator<Item = &IdentifierStats> {
        self.ids.values()
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of frames folded so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of inter-arrival deltas that were negative
    pub fn negative_deltas(&self) -> u64 {
        self.negative_deltas
    }

    /// Timestamp of the first frame in file order
    pub fn first_timestamp(&self) -> Option<f64> {
        self.first_timestamp
    }

    /// Timestamp of the last frame in file order
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Observation window across all identifiers (0 when empty)
    pub fn duration(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Sum of estimated wire bits across all identifiers
    pub fn total_bits(&self) -> u64 {
        self.ids.values().map(|stats| stats.total_bits).sum()
    }

    /// Rate and jitter figures per identifier
    pub fn finalize(&self) -> BTreeMap<u32, IdentifierSummary> {
        self.ids
            .iter()
            .map(|(can_id, stats)| (*can_id, stats.summary()))
            .collect()
    }

    /// Bus load over the whole trace at the given bit rate
    pub fn bus_load(&self, bus_rate_mbps: f64) -> BusLoad {
        BusLoad::new(self.total_bits(), self.duration(), bus_rate_mbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(timestamp: f64, can_id: u32, dlc: u8) -> Frame {
        Frame {
            timestamp,
            can_id,
            dlc,
            is_extended: false,
            data: vec![0; usize::from(dlc)],
        }
    }

    fn sample_std_dev(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    }

    #[test]
    fn test_first_sighting() {
        let mut agg = StatisticsAggregator::new();
        agg.update(&frame(1.5, 0x123, 8));

        let stats = agg.get(0x123).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.first_timestamp, 1.5);
        assert_eq!(stats.last_timestamp, 1.5);
        assert_eq!(stats.total_bits, 132);
        assert_eq!(stats.delta_count(), 0);
        assert_eq!(stats.average_rate_hz(), 0.0);
        assert_eq!(stats.jitter_std_dev(), 0.0);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let mut agg = StatisticsAggregator::new();
        for ts in [0.0, 0.1, 0.2] {
            agg.update(&frame(ts, 0x123, 2));
        }
        for ts in [0.05, 0.25] {
            agg.update(&frame(ts, 0x456, 1));
        }

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.frame_count(), 5);
        assert_eq!(agg.get(0x123).unwrap().count, 3);
        assert_eq!(agg.get(0x456).unwrap().count, 2);
        assert!((agg.get(0x123).unwrap().average_rate_hz() - 10.0).abs() < 1e-9);
        assert!((agg.get(0x456).unwrap().average_rate_hz() - 5.0).abs() < 1e-9);

        // duration spans identifiers, in file order
        assert!((agg.duration() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_count_matches_deltas_and_bits() {
        let mut agg = StatisticsAggregator::new();
        let frames = [frame(0.0, 0x10, 0), frame(0.5, 0x10, 4), frame(1.0, 0x10, 8)];
        for f in &frames {
            agg.update(f);
        }

        let stats = agg.get(0x10).unwrap();
        assert_eq!(stats.count, stats.delta_count() + 1);
        let expected_bits: u64 = frames.iter().map(|f| u64::from(f.wire_bits())).sum();
        assert_eq!(stats.total_bits, expected_bits);
        assert_eq!(agg.total_bits(), expected_bits);
    }

    #[test]
    fn test_jitter_matches_sample_variance() {
        let timestamps = [0.0, 0.010, 0.025, 0.031, 0.050];
        let deltas: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();

        let mut agg = StatisticsAggregator::new();
        for ts in timestamps {
            agg.update(&frame(ts, 0x200, 8));
        }

        let stats = agg.get(0x200).unwrap();
        assert!(stats.has_jitter());
        assert!(stats.jitter_std_dev() > 0.0);
        assert!((stats.jitter_std_dev() - sample_std_dev(&deltas)).abs() < 1e-12);
    }

    #[test]
    fn test_regular_spacing_has_no_jitter() {
        let mut agg = StatisticsAggregator::new();
        for i in 0..10 {
            agg.update(&frame(i as f64 * 0.25, 0x300, 8));
        }
        assert!(agg.get(0x300).unwrap().jitter_std_dev() < 1e-12);
    }

    #[test]
    fn test_single_delta_has_zero_jitter() {
        let mut agg = StatisticsAggregator::new();
        agg.update(&frame(0.0, 0x1, 1));
        agg.update(&frame(0.3, 0x1, 1));

        let stats = agg.get(0x1).unwrap();
        assert!(!stats.has_jitter());
        assert_eq!(stats.jitter_std_dev(), 0.0);
    }

    #[test]
    fn test_out_of_order_timestamps_propagate() {
        let mut agg = StatisticsAggregator::new();
        agg.update(&frame(1.0, 0x7, 1));
        agg.update(&frame(0.5, 0x7, 1));
        agg.update(&frame(2.0, 0x7, 1));

        let stats = agg.get(0x7).unwrap();
        assert_eq!(stats.last_timestamp, 2.0);
        assert_eq!(agg.negative_deltas(), 1);
        assert!((stats.delta_sum() - 1.0).abs() < 1e-12);
        assert!((stats.jitter_std_dev() - sample_std_dev(&[-0.5, 1.5])).abs() < 1e-12);
    }

    #[test]
    fn test_zero_span_has_zero_rate() {
        let mut agg = StatisticsAggregator::new();
        agg.update(&frame(3.0, 0x5, 1));
        agg.update(&frame(3.0, 0x5, 1));
        assert_eq!(agg.get(0x5).unwrap().average_rate_hz(), 0.0);
        assert_eq!(agg.bus_load(1.0).load_percent, 0.0);
    }

    #[test]
    fn test_empty_aggregator() {
        let agg = StatisticsAggregator::new();
        assert!(agg.is_empty());
        assert!(agg.finalize().is_empty());
        assert_eq!(agg.duration(), 0.0);
        assert_eq!(agg.bus_load(1.0).total_bits, 0);
    }

    #[test]
    fn test_rerun_is_identical() {
        let frames: Vec<Frame> = (0..20)
            .map(|i| frame(i as f64 * 0.013 + (i % 3) as f64 * 0.001, 0x100 + (i % 4), 8))
            .collect();

        let run = || {
            let mut agg = StatisticsAggregator::new();
            frames.iter().for_each(|f| agg.update(f));
            agg
        };

        assert_eq!(run(), run());
        assert_eq!(run().finalize(), run().finalize());
    }

    #[test]
    fn test_finalize_is_sorted() {
        let mut agg = StatisticsAggregator::new();
        for id in [0x700, 0x001, 0x1FFF_FFFF, 0x123] {
            agg.update(&frame(0.0, id, 0));
        }
        let ids: Vec<u32> = agg.finalize().keys().copied().collect();
        assert_eq!(ids, vec![0x001, 0x123, 0x700, 0x1FFF_FFFF]);
    }
}
