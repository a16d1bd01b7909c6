//! Optional signal decoding capability
//!
//! The analyzer works without any decoder. When one is injected, every frame
//! of the targeted identifier is handed to it and the outcome is reported
//! next to the raw line.

use crate::message_decoder::MessageDecoder;
use crate::signals::{DatabaseStats, SignalDatabase};
use crate::types::{DecodeFailure, DecodedSignal, Result};
use std::path::Path;

/// Maps a raw payload to named signal values
pub trait SignalDecoder {
    /// Decode `data` as the message registered for `can_id`
    fn decode(&self, can_id: u32, data: &[u8]) -> std::result::Result<Vec<DecodedSignal>, DecodeFailure>;

    /// Human readable message name for an identifier, if known
    fn message_name(&self, _can_id: u32) -> Option<&str> {
        None
    }
}

/// [`SignalDecoder`] backed by one or more DBC files
#[derive(Debug, Default)]
pub struct DbcSignalDecoder {
    signal_db: SignalDatabase,
}

impl DbcSignalDecoder {
    /// Create a decoder with an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder from a single DBC file
    ///
    /// # Example
    /// ```no_run
    /// use can_trace_analyzer::{DbcSignalDecoder, SignalDecoder};
    /// use std::path::Path;
    ///
    /// let decoder = DbcSignalDecoder::from_dbc_file(Path::new("powertrain.dbc")).unwrap();
    /// let signals = decoder.decode(0x123, &[0xE8, 0x03, 0, 0, 0, 0, 0, 0]);
    /// ```
    pub fn from_dbc_file(path: &Path) -> Result<Self> {
        let mut decoder = Self::new();
        decoder.add_dbc(path)?;
        Ok(decoder)
    }

    /// Load a DBC file and add its definitions to the database
    ///
    /// Identifiers already defined by an earlier file keep their first
    /// definition.
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        for message in messages {
            self.signal_db.add_message(message);
        }

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Get statistics about the loaded database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }
}

impl SignalDecoder for DbcSignalDecoder {
    fn decode(&self, can_id: u32, data: &[u8]) -> std::result::Result<Vec<DecodedSignal>, DecodeFailure> {
        let message_def = self
            .signal_db
            .get_message(can_id)
            .ok_or(DecodeFailure::IdentifierUnknown(can_id))?;

        log::trace!("Decoding message: {} (ID 0x{:X})", message_def.name, can_id);
        MessageDecoder::decode_message(data, message_def)
    }

    fn message_name(&self, can_id: u32) -> Option<&str> {
        self.signal_db
            .get_message(can_id)
            .map(|message| message.name.as_str())
    }
}
