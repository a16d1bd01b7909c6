//! On-wire size estimation for classic CAN frames

/// Fixed (non-data) bits of a standard frame: SOF, 11-bit ID, RTR, IDE, r0,
/// DLC, CRC, delimiters, ACK and EOF.
const STANDARD_OVERHEAD_BITS: u32 = 44;

/// Fixed bits of an extended frame (adds SRR and the 18-bit ID extension).
const EXTENDED_OVERHEAD_BITS: u32 = 64;

/// Stuffing-subject width of the standard arbitration + control fields.
const STANDARD_STUFFED_HEADER_BITS: u32 = 12 + 6;

/// Stuffing-subject width of the extended arbitration + control fields.
const EXTENDED_STUFFED_HEADER_BITS: u32 = 34;

const CRC_BITS: u32 = 15;

/// Estimate the total bits one frame occupies on the bus
///
/// Worst-case stuffing is approximated as one stuff bit per four bits of the
/// stuffing-subject fields (arbitration, control, data, CRC).
///
/// # Example
/// ```
/// use can_trace_analyzer::estimate_bits;
///
/// assert_eq!(estimate_bits(8, false), 132);
/// assert_eq!(estimate_bits(8, true), 156);
/// ```
pub fn estimate_bits(dlc: u8, is_extended: bool) -> u32 {
    let data_bits = u32::from(dlc) * 8;
    let (overhead, stuffed_header) = if is_extended {
        (EXTENDED_OVERHEAD_BITS, EXTENDED_STUFFED_HEADER_BITS)
    } else {
        (STANDARD_OVERHEAD_BITS, STANDARD_STUFFED_HEADER_BITS)
    };
    let stuff_bits = (stuffed_header + data_bits + CRC_BITS) / 4;

    overhead + data_bits + stuff_bits
}
