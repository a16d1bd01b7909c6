//! Main analyzer API
//!
//! The [`Analyzer`] is the entry point of the library. It detects the trace
//! dialect, streams all frames through a [`StatisticsAggregator`], and on
//! request performs a second pass filtered by one identifier, decoding each
//! matching frame with the injected [`SignalDecoder`].

use crate::config::AnalyzerConfig;
use crate::formats::{detect_file, TraceReader, TraceRecord};
use crate::signal_decoder::SignalDecoder;
use crate::stats::{BusLoad, IdentifierSummary, StatisticsAggregator};
use crate::types::{AnalyzerError, DecodeFailure, DecodedSignal, LogDialect, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Earliest timestamp treated as a Unix epoch value (2000-01-01T00:00:00Z)
const EPOCH_THRESHOLD_S: f64 = 946_684_800.0;

/// The main analyzer - entry point for all analysis operations
pub struct Analyzer {
    config: AnalyzerConfig,
    signal_decoder: Option<Box<dyn SignalDecoder>>,
}

impl Analyzer {
    /// Create an analyzer without signal decoding
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            signal_decoder: None,
        }
    }

    /// Builder method: attach a signal decoder for the targeted pass
    pub fn with_signal_decoder(mut self, decoder: Box<dyn SignalDecoder>) -> Self {
        self.signal_decoder = Some(decoder);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn signal_decoder(&self) -> Option<&dyn SignalDecoder> {
        self.signal_decoder.as_deref()
    }

    /// Detect the dialect of a trace file
    ///
    /// # Returns
    /// * `Err(AnalyzerError::FileOpen)` if the file cannot be opened
    /// * `Err(AnalyzerError::UnknownDialect)` if no dialect marker was found
    ///   within the detection window
    pub fn detect(&self, path: &Path) -> Result<LogDialect> {
        open_trace(path)?;

        match detect_file(path, self.config.detection_window) {
            LogDialect::Unknown => Err(AnalyzerError::UnknownDialect(path.display().to_string())),
            dialect => Ok(dialect),
        }
    }

    /// Detect the dialect of a file and aggregate all of its frames
    ///
    /// # Example
    /// ```no_run
    /// use can_trace_analyzer::{Analyzer, AnalyzerConfig};
    /// use std::path::Path;
    ///
    /// let analyzer = Analyzer::new(AnalyzerConfig::new().with_bus_rate(0.5));
    /// let analysis = analyzer.analyze_file(Path::new("trace.trc")).unwrap();
    ///
    /// for (can_id, summary) in analysis.summaries() {
    ///     println!("0x{:X}: {} frames, {:.2} Hz", can_id, summary.count, summary.average_rate_hz);
    /// }
    /// ```
    pub fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let dialect = self.detect(path)?;
        log::info!("Analyzing {:?} as {}", path, dialect);

        let file = open_trace(path)?;
        self.analyze_reader(BufReader::new(file), dialect)
    }

    /// Aggregate all frames of an already opened trace
    pub fn analyze_reader<R: BufRead>(&self, reader: R, dialect: LogDialect) -> Result<Analysis> {
        let mut records =
            TraceReader::new(reader, dialect)?.with_malformed_warnings(self.config.report_malformed);
        let mut stats = StatisticsAggregator::new();

        for record in records.by_ref() {
            stats.update(&record?.frame);
        }

        log::info!(
            "Aggregated {} frames over {} identifiers ({} malformed lines)",
            stats.frame_count(),
            stats.len(),
            records.malformed_lines()
        );

        Ok(Analysis {
            dialect: records.dialect(),
            lines_read: records.lines_read(),
            malformed_lines: records.malformed_lines(),
            bus_rate_mbps: self.config.bus_rate_mbps,
            stats,
        })
    }

    /// Re-read a trace and yield every frame of one identifier
    ///
    /// Frames with a payload are decoded when a signal decoder is attached.
    /// Malformed lines were already reported by the aggregation pass and are
    /// skipped quietly here.
    pub fn filter_file(
        &self,
        path: &Path,
        dialect: LogDialect,
        can_id: u32,
    ) -> Result<Box<dyn Iterator<Item = Result<PacketMatch>> + '_>> {
        let file = open_trace(path)?;
        let records = TraceReader::new(BufReader::new(file), dialect)?.with_malformed_warnings(false);
        let decoder = self.signal_decoder();

        Ok(Box::new(records.filter_map(move |record| match record {
            Ok(record) if record.frame.can_id == can_id => {
                let decoded = match decoder {
                    Some(decoder) if !record.frame.data.is_empty() => {
                        Some(decoder.decode(can_id, &record.frame.data))
                    }
                    _ => None,
                };
                Some(Ok(PacketMatch { record, decoded }))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

fn open_trace(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| AnalyzerError::FileOpen {
        path: path.display().to_string(),
        source,
    })
}

/// One frame of the targeted identifier
#[derive(Debug, Clone, PartialEq)]
pub struct PacketMatch {
    pub record: TraceRecord,
    /// `None` when no decoder is attached or the frame has no payload
    pub decoded: Option<std::result::Result<Vec<DecodedSignal>, DecodeFailure>>,
}

/// Result of one aggregation pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub dialect: LogDialect,
    pub stats: StatisticsAggregator,
    pub lines_read: usize,
    pub malformed_lines: usize,
    pub bus_rate_mbps: f64,
}

impl Analysis {
    /// True when the trace contained no frames at all
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Per-identifier figures, ascending by identifier
    pub fn summaries(&self) -> BTreeMap<u32, IdentifierSummary> {
        self.stats.finalize()
    }

    pub fn bus_load(&self) -> BusLoad {
        self.stats.bus_load(self.bus_rate_mbps)
    }

    /// Wall-clock time of the first frame, when timestamps are Unix epoch
    /// seconds rather than offsets from the start of the capture
    pub fn capture_start(&self) -> Option<DateTime<Utc>> {
        let first = self.stats.first_timestamp()?;
        if !first.is_finite() || first < EPOCH_THRESHOLD_S {
            return None;
        }

        // trace timestamps carry at most microsecond resolution
        let secs = first.floor();
        let micros = ((first - secs) * 1e6).round().min(999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, micros * 1_000)
    }
}
