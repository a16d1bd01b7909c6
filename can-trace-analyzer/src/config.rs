//! Analyzer configuration types
//!
//! The analyzer only needs a handful of knobs. Report layout, target
//! identifiers and output formats belong to the application layer.

use serde::{Deserialize, Serialize};

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Nominal bus bit rate in Mbit/s, used only for the bus-load estimate
    #[serde(default = "default_bus_rate")]
    pub bus_rate_mbps: f64,

    /// Number of non-empty lines inspected during dialect detection
    #[serde(default = "default_detection_window")]
    pub detection_window: usize,

    /// Log a warning for every malformed line (they are always skipped)
    #[serde(default = "default_true")]
    pub report_malformed: bool,
}

fn default_bus_rate() -> f64 {
    1.0
}

fn default_detection_window() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bus_rate_mbps: default_bus_rate(),
            detection_window: default_detection_window(),
            report_malformed: default_true(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the bus bit rate in Mbit/s
    pub fn with_bus_rate(mut self, mbps: f64) -> Self {
        self.bus_rate_mbps = mbps;
        self
    }

    /// Builder method: set the detection window size
    pub fn with_detection_window(mut self, lines: usize) -> Self {
        self.detection_window = lines;
        self
    }

    /// Builder method: enable or disable malformed-line warnings
    pub fn with_malformed_warnings(mut self, enabled: bool) -> Self {
        self.report_malformed = enabled;
        self
    }
}
