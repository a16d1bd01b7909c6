//! DBC file parser
//!
//! Parses Vector DBC files with the `can-dbc` crate and converts them into
//! the internal message database format.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MultiplexerInfo, SignalDefinition, ValueType,
};
use crate::types::{AnalyzerError, Result, MAX_EXTENDED_ID};
use std::path::Path;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        AnalyzerError::DatabaseLoad(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // DBC files are frequently Windows-1252; fall back to a Latin-1 reading
    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let dbc = can_dbc::DBC::from_slice(dbc_content.as_bytes()).map_err(|e| {
        AnalyzerError::DatabaseLoad(format!("Failed to parse DBC file {:?}: {:?}", path, e))
    })?;

    let messages = dbc
        .messages()
        .iter()
        .map(convert_message)
        .collect::<Result<Vec<_>>>()?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc_msg: &can_dbc::Message) -> Result<MessageDefinition> {
    // First pass: identify multiplexer signal
    let multiplexer_signal_name = dbc_msg
        .signals()
        .iter()
        .find(|dbc_sig| {
            matches!(
                dbc_sig.multiplexer_indicator(),
                can_dbc::MultiplexIndicator::Multiplexor
            )
        })
        .map(|dbc_sig| dbc_sig.name().to_string());

    // Second pass: convert all signals
    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| convert_signal(dbc_sig, multiplexer_signal_name.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageDefinition {
        // bit 31 marks extended IDs in DBC files
        id: dbc_msg.message_id().0 & MAX_EXTENDED_ID,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        signals,
        multiplexer_signal: multiplexer_signal_name,
    })
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    multiplexer_signal_name: Option<&str>,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => Some(MultiplexerInfo {
            multiplexer_signal: multiplexer_signal_name
                .ok_or_else(|| {
                    AnalyzerError::DatabaseLoad(format!(
                        "Multiplexed signal '{}' but no multiplexer found",
                        dbc_sig.name()
                    ))
                })?
                .to_string(),
            multiplexer_values: vec![switch_value],
        }),
        _ => None,
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        multiplexer_info,
    })
}
