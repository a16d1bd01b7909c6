//! Vector ASCII log (`.asc`) parser
//!
//! ```text
//! date Wed Jun 12 10:15:32.123 am 2024
//! base hex  timestamps absolute
//!    0.000100 1  1F4x             Rx   d 8 11 22 33 44 55 66 77 88
//!    0.000250 1  123              Tx   r 4
//! ```
//!
//! Columns: time, channel, identifier (trailing `x` = extended), direction,
//! frame kind (`d` data / `r` remote), DLC, data bytes.

use super::{parse_data_bytes, parse_dlc, parse_identifier, ParsedLine};
use crate::types::{Frame, MAX_STANDARD_ID};

const ID_COLUMN: usize = 2;
const KIND_COLUMN: usize = 4;
const DLC_COLUMN: usize = 5;

/// Parse one Vector ASC line
pub fn parse_line(line: &str) -> ParsedLine {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return ParsedLine::Skip;
    }

    // header lines and footers ("End TriggerBlock") do not start with a time
    let timestamp = match parts[0].parse::<f64>() {
        Ok(ts) if ts.is_finite() => ts,
        _ => return ParsedLine::Skip,
    };

    // anything else in the kind column is an event line (Statistic:, ErrorFrame...)
    let is_remote = match parts[KIND_COLUMN] {
        "d" | "D" => false,
        "r" | "R" => true,
        _ => return ParsedLine::Skip,
    };

    extract(&parts, timestamp, is_remote).into()
}

fn extract(parts: &[&str], timestamp: f64, is_remote: bool) -> Result<Frame, String> {
    let id_token = parts[ID_COLUMN];
    let id_text = id_token.trim_end_matches(|c| c == 'x' || c == 'X');
    let has_extended_suffix = id_text.len() != id_token.len();

    let can_id = parse_identifier(id_text)?;
    let dlc = parse_dlc(parts[DLC_COLUMN])?;
    let data = if is_remote {
        Vec::new()
    } else {
        parse_data_bytes(parts[DLC_COLUMN + 1..].iter().copied(), dlc)
    };

    Ok(Frame {
        timestamp,
        can_id,
        dlc,
        is_extended: has_extended_suffix || can_id > MAX_STANDARD_ID,
        data,
    })
}
