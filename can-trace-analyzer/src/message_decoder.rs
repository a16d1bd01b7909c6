//! Message Decoding Engine
//!
//! Extracts signal values from raw CAN payloads based on signal definitions
//! from the message database. Handles bit extraction, endianness,
//! multiplexing, and physical value conversion.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};
use crate::types::{DecodeFailure, DecodedSignal, SignalValue};

/// Message decoder - extracts signals from CAN payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a payload against a message definition
    ///
    /// # Returns
    /// * `Ok(signals)` in definition order; multiplexed signals whose selector
    ///   value does not match are left out
    /// * `Err(DecodeFailure::DecodeError)` if the payload is shorter than the
    ///   message or a signal does not fit into it
    pub fn decode_message(
        data: &[u8],
        message_def: &MessageDefinition,
    ) -> Result<Vec<DecodedSignal>, DecodeFailure> {
        if data.len() < message_def.size {
            return Err(DecodeFailure::DecodeError(format!(
                "{} expects {} bytes, payload has {}",
                message_def.name,
                message_def.size,
                data.len()
            )));
        }

        // For multiplexed messages, first extract the multiplexer signal value
        let mut multiplexer_value: Option<u64> = None;
        if let Some(ref mux_signal_name) = message_def.multiplexer_signal {
            if let Some(mux_signal) = message_def.signals.iter().find(|s| s.name == *mux_signal_name) {
                multiplexer_value = Some(Self::extract_signal_value(data, mux_signal)? as u64);
            }
        }

        let mut decoded_signals = Vec::with_capacity(message_def.signals.len());
        for signal in &message_def.signals {
            if let Some(ref mux_info) = signal.multiplexer_info {
                match multiplexer_value {
                    Some(current) if mux_info.multiplexer_values.contains(&current) => {}
                    _ => continue,
                }
            }

            decoded_signals.push(Self::decode_signal(data, signal)?);
        }

        Ok(decoded_signals)
    }

    /// Decode a single signal from CAN payload data
    fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Result<DecodedSignal, DecodeFailure> {
        let raw_value = Self::extract_signal_value(data, signal)?;

        // Apply physical value conversion (factor and offset)
        let physical_value = signal.offset + signal.factor * (raw_value as f64);

        let value = if signal.factor == 1.0 && signal.offset == 0.0 && signal.length == 1 {
            // Boolean signal (single bit, no scaling)
            SignalValue::Boolean(raw_value != 0)
        } else if signal.factor != 1.0 || signal.offset != 0.0 {
            SignalValue::Float(physical_value)
        } else {
            SignalValue::Integer(raw_value)
        };

        Ok(DecodedSignal {
            name: signal.name.clone(),
            value,
            unit: signal.unit.clone(),
            raw_value,
        })
    }

    /// Extract the raw (sign-extended) value of a signal
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Result<i64, DecodeFailure> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        }
        .ok_or_else(|| {
            DecodeFailure::DecodeError(format!(
                "signal '{}' ({} bits at bit {}) exceeds {}-byte payload",
                signal.name,
                length,
                start_bit,
                data.len()
            ))
        })?;

        Ok(match signal.value_type {
            ValueType::Unsigned => raw_value as i64,
            ValueType::Signed => Self::sign_extend(raw_value, length),
        })
    }

    /// Extract signal with little-endian (Intel) byte order
    ///
    /// The start bit is the LSB; bits are numbered from LSB to MSB within
    /// each byte, byte 0 first.
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let required_bytes = (start_bit + length + 7) / 8;
        if required_bytes > data.len() || length > 64 {
            return None;
        }

        let mut result: u64 = 0;
        for i in 0..length {
            let bit_pos = start_bit + i;
            let bit_value = (data[bit_pos / 8] >> (bit_pos % 8)) & 0x01;
            result |= (bit_value as u64) << i;
        }

        Some(result)
    }

    /// Extract signal with big-endian (Motorola) byte order
    ///
    /// The start bit is the MSB in DBC numbering (bit 7 of byte 0 is 7, bit 0
    /// of byte 1 is 8). Walking towards the LSB moves down inside a byte and
    /// then to bit 7 of the next byte.
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        if length > 64 {
            return None;
        }

        let mut result: u64 = 0;
        let mut bit_pos = start_bit;
        for i in 0..length {
            let byte = *data.get(bit_pos / 8)?;
            let bit_in_byte = bit_pos % 8;
            result = (result << 1) | u64::from((byte >> bit_in_byte) & 0x01);

            if i + 1 < length {
                bit_pos = if bit_in_byte == 0 { bit_pos + 15 } else { bit_pos - 1 };
            }
        }

        Some(result)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length == 0 || bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}
