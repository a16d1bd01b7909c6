//! SocketCAN `candump` log parser
//!
//! Handles the compact log format written by `candump -l`:
//!
//! ```text
//! (1623456789.123456) can0 123#DEADBEEF
//! (1623456789.223456) can0 1F334455#R
//! ```
//!
//! and the timestamped human-readable output of `candump -ta`:
//!
//! ```text
//! (1623456789.123456)  can0  123   [4]  DE AD BE EF
//! ```

use super::{is_extended_id, parse_data_bytes, parse_dlc, parse_identifier, parse_timestamp, ParsedLine};
use crate::types::{Frame, MAX_DLC};

/// Parse one candump line
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if !line.starts_with('(') {
        return ParsedLine::Skip;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return ParsedLine::Skip;
    }

    extract(&parts).into()
}

fn extract(parts: &[&str]) -> Result<Frame, String> {
    let timestamp = parse_timestamp(parts[0].trim_matches(|c| c == '(' || c == ')'))?;

    let (id_text, dlc, data) = match parts[2].split_once('#') {
        Some((id_text, payload)) => {
            let (dlc, data) = parse_compact_payload(payload)?;
            (id_text, dlc, data)
        }
        None => {
            let (dlc, data) = match parts.get(3) {
                Some(token) if token.starts_with('[') => {
                    let dlc = parse_dlc(token.trim_start_matches('[').trim_end_matches(']'))?;
                    (dlc, parse_data_bytes(parts[4..].iter().copied(), dlc))
                }
                _ => (0, Vec::new()),
            };
            (parts[2], dlc, data)
        }
    };

    let can_id = parse_identifier(id_text)?;

    Ok(Frame {
        timestamp,
        can_id,
        dlc,
        is_extended: is_extended_id(id_text, can_id),
        data,
    })
}

/// Decode the part after `#`: hex bytes (optionally dot separated), or
/// `R[len]` for a remote frame
fn parse_compact_payload(payload: &str) -> Result<(u8, Vec<u8>), String> {
    if payload.starts_with('#') {
        return Err("CAN FD frames are not supported".to_string());
    }

    if let Some(len) = payload.strip_prefix('R').or_else(|| payload.strip_prefix('r')) {
        let dlc = if len.is_empty() { 0 } else { parse_dlc(len)? };
        return Ok((dlc, Vec::new()));
    }

    let hex: String = payload.chars().filter(|c| *c != '.').collect();
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid payload '{}'", payload));
    }
    // a trailing half byte is dropped; the DLC is the number of whole bytes
    let whole_bytes = hex.len() / 2;
    if whole_bytes > usize::from(MAX_DLC) {
        return Err(format!("payload '{}' longer than {} bytes", payload, MAX_DLC));
    }

    let data = (0..whole_bytes * 2)
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| format!("invalid payload '{}'", payload))?;

    Ok((data.len() as u8, data))
}
