//! Message definition database
//!
//! Holds message and signal layouts loaded from one or more DBC files,
//! keyed by CAN identifier.

use std::collections::HashMap;

/// A complete CAN message definition
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    /// CAN message ID (29-bit range, extended flag stripped)
    pub id: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// All signals in this message
    pub signals: Vec<SignalDefinition>,
    /// Multiplexer signal name (if multiplexed)
    pub multiplexer_signal: Option<String>,
}

/// A CAN signal definition
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit in the CAN frame (DBC numbering)
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
    /// Multiplexer info (None if not multiplexed)
    pub multiplexer_info: Option<MultiplexerInfo>,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// Multiplexer information for multiplexed signals
#[derive(Debug, Clone)]
pub struct MultiplexerInfo {
    /// Name of the multiplexer signal that controls this signal
    pub multiplexer_signal: String,
    /// Multiplexer value(s) for which this signal is active
    pub multiplexer_values: Vec<u64>,
}

/// The message definition database
#[derive(Debug, Default)]
pub struct SignalDatabase {
    /// Key: CAN ID, Value: messages with that ID (several DBCs may define it)
    messages: HashMap<u32, Vec<MessageDefinition>>,
}

impl SignalDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message definition to the database
    pub fn add_message(&mut self, message: MessageDefinition) {
        self.messages
            .entry(message.id)
            .or_insert_with(Vec::new)
            .push(message);
    }

    /// Get the message definition for a CAN ID (first loaded wins)
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&can_id).and_then(|msgs| msgs.first())
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let num_messages: usize = self.messages.values().map(|v| v.len()).sum();
        let num_signals: usize = self
            .messages
            .values()
            .flat_map(|msgs| msgs.iter())
            .map(|msg| msg.signals.len())
            .sum();

        DatabaseStats {
            num_messages,
            num_signals,
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}
