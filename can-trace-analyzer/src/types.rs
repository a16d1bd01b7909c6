//! Core types for the CAN trace analyzer library
//!
//! This module defines the frame record produced by the dialect parsers, the
//! dialect enumeration itself, the decoded signal types returned by a
//! [`SignalDecoder`](crate::SignalDecoder), and the error types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Highest identifier representable with standard (11-bit) addressing
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Highest identifier representable with extended (29-bit) addressing
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Maximum data length code of a classic CAN frame
pub const MAX_DLC: u8 = 8;

/// Text log dialects the analyzer understands
///
/// The dialect is determined once per file and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDialect {
    /// PEAK PCAN-View trace (`.trc`)
    Trc,
    /// Linux `candump -l` / `candump -ta` log
    CandumpAsc,
    /// Vector CANalyzer/CANoe ASCII log (`.asc`)
    VectorAsc,
    /// No known dialect matched
    Unknown,
}

impl fmt::Display for LogDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDialect::Trc => write!(f, "trc"),
            LogDialect::CandumpAsc => write!(f, "candump_asc"),
            LogDialect::VectorAsc => write!(f, "vector_asc"),
            LogDialect::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single CAN frame reconstructed from one log line
///
/// Frames are transient: the aggregator folds them into running statistics
/// and drops them.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Timestamp in seconds (relative or Unix epoch, depending on the dialect)
    pub timestamp: f64,
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Declared data length code (0-8)
    pub dlc: u8,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// Payload bytes as present in the log; may be shorter than `dlc`
    pub data: Vec<u8>,
}

impl Frame {
    /// Estimated number of bits this frame occupied on the wire
    pub fn wire_bits(&self) -> u32 {
        crate::bits::estimate_bits(self.dlc, self.is_extended)
    }
}

/// Parse a hexadecimal CAN identifier, with or without a `0x` prefix
///
/// Leading zeros are irrelevant: `"0123"`, `"123"` and `"0x123"` all yield
/// `0x123`. Values outside the 29-bit range are rejected.
pub fn parse_can_id(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .filter(|id| *id <= MAX_EXTENDED_ID)
}

/// Errors that abort an analysis run
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Failed to open trace file {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine log dialect of {0}")]
    UnknownDialect(String),

    #[error("Failed to load message database: {0}")]
    DatabaseLoad(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Per-frame signal decoding failures
///
/// These are never fatal: they are reported next to the offending line and
/// do not influence the statistics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeFailure {
    #[error("ID 0x{0:X} not found in message database")]
    IdentifierUnknown(u32),

    #[error("Error decoding: {0}")]
    DecodeError(String),
}

/// A decoded signal with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the message database
    pub name: String,
    /// Decoded physical value
    pub value: SignalValue,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
    /// Raw value before scaling
    pub raw_value: i64,
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Signal value types supported by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Signed integer value
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single unscaled bit)
    Boolean(bool),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:.3}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}
