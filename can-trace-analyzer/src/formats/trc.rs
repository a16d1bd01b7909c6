//! PEAK PCAN trace (`.trc`) parser
//!
//! Two data line layouts are accepted:
//!
//! ```text
//!      1)      1059.900 DT     0300 Rx 7  00 00 00 00 04 00 00
//!      1)      1841.0  Rx         0001  8  00 00 00 00 00 00 00 00
//! ```
//!
//! The first carries the `DT` message-type marker (file version 2.x), the
//! second is the legacy 1.x layout with the direction/type in column 3.
//! Times are in milliseconds; lines starting with `;` are comments.

use super::{is_extended_id, parse_data_bytes, parse_dlc, parse_identifier, parse_timestamp, ParsedLine};
use crate::types::Frame;

/// Column positions of one TRC layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    id: usize,
    dlc: usize,
}

/// `<seq> <time_ms> DT <id> <Rx|Tx> <dlc> <data>...`
const DT_LAYOUT: Layout = Layout { id: 3, dlc: 5 };

/// `<seq>) <time_ms> <type> <id> <dlc> <data>...`
const LEGACY_LAYOUT: Layout = Layout { id: 3, dlc: 4 };

const DT_MARKER: &str = "DT";

/// Parse one TRC line
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return ParsedLine::Skip;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return ParsedLine::Skip;
    }

    let layout = if parts[2] == DT_MARKER {
        DT_LAYOUT
    } else if parts[0].ends_with(')') {
        LEGACY_LAYOUT
    } else {
        return ParsedLine::Skip;
    };

    extract(&parts, layout).into()
}

fn extract(parts: &[&str], layout: Layout) -> Result<Frame, String> {
    let dlc_token = parts
        .get(layout.dlc)
        .ok_or_else(|| "truncated data line".to_string())?;

    let timestamp = parse_timestamp(parts[1])? / 1000.0;
    let id_text = parts[layout.id];
    let can_id = parse_identifier(id_text)?;
    let dlc = parse_dlc(dlc_token)?;
    let data = parse_data_bytes(parts[layout.dlc + 1..].iter().copied(), dlc);

    Ok(Frame {
        timestamp,
        can_id,
        dlc,
        is_extended: is_extended_id(id_text, can_id),
        data,
    })
}
