//! CAN Trace Analyzer Library
//!
//! A reusable library for analyzing offline CAN trace files written by
//! different capture tools (PCAN TRC, candump, Vector ASC), with optional
//! signal decoding from DBC files.
//!
//! # Architecture
//!
//! - Detects the log dialect from the first lines of a file
//! - Streams frames through one pure line parser per dialect
//! - Aggregates per-identifier counts, rates and jitter in constant memory
//! - Estimates the wire bits of every frame, including worst-case stuffing,
//!   and derives the bus load from them
//! - Optionally decodes the frames of one identifier into signal values
//!
//! The library does NOT:
//! - Capture live traffic or replay frames
//! - Validate traces beyond what is needed to extract frames
//! - Render reports
//!
//! Report rendering and argument parsing live in the application layer
//! (can-trace-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use can_trace_analyzer::{Analyzer, AnalyzerConfig, DbcSignalDecoder};
//! use std::path::Path;
//!
//! let decoder = DbcSignalDecoder::from_dbc_file(Path::new("powertrain.dbc")).unwrap();
//! let analyzer = Analyzer::new(AnalyzerConfig::new().with_bus_rate(0.5))
//!     .with_signal_decoder(Box::new(decoder));
//!
//! let trace = Path::new("trace.asc");
//! let analysis = analyzer.analyze_file(trace).unwrap();
//! println!("Bus load: {:.2}%", analysis.bus_load().load_percent);
//!
//! for packet in analyzer.filter_file(trace, analysis.dialect, 0x123).unwrap() {
//!     match packet {
//!         Ok(packet) => println!("{}", packet.record.line),
//!         Err(e) => eprintln!("Read error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod analyzer;
pub mod bits;
pub mod config;
pub mod formats;
pub mod signal_decoder;
pub mod signals;
pub mod stats;
pub mod types;

// Re-export main types for convenience
pub use analyzer::{Analysis, Analyzer, PacketMatch};
pub use bits::estimate_bits;
pub use config::AnalyzerConfig;
pub use formats::{detect_dialect, detect_file, ParsedLine, TraceReader, TraceRecord};
pub use signal_decoder::{DbcSignalDecoder, SignalDecoder};
pub use signals::DatabaseStats;
pub use stats::{compute_load, BusLoad, IdentifierStats, IdentifierSummary, StatisticsAggregator};
pub use types::{
    parse_can_id, AnalyzerError, DecodeFailure, DecodedSignal, Frame, LogDialect, Result,
    SignalValue,
};

// Internal modules (not exposed in public API)
mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
