//! Report generation
//!
//! Renders an [`Analysis`] as a plain-text report or as JSON. The text form
//! lists identifiers ascending, followed by the bus-load block and, when an
//! identifier is targeted, every matching raw line with its decoded signals.

use anyhow::Result;
use can_trace_analyzer::{
    Analysis, BusLoad, DecodeFailure, DecodedSignal, IdentifierSummary, PacketMatch,
    SignalDecoder,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Write the statistics part of the text report
pub fn write_text_summary<W: Write>(
    out: &mut W,
    analysis: &Analysis,
    decoder: Option<&dyn SignalDecoder>,
) -> Result<()> {
    writeln!(out, "Detected file type: {}", analysis.dialect)?;
    if let Some(start) = analysis.capture_start() {
        writeln!(out, "Capture start:      {}", start)?;
    }

    if analysis.is_empty() {
        writeln!(out, "\nNo valid CAN data parsed.")?;
        write_malformed(out, analysis)?;
        return Ok(());
    }

    writeln!(out, "\n--- Message Rate Analysis ---")?;
    for (can_id, summary) in analysis.summaries() {
        let name = decoder
            .and_then(|d| d.message_name(can_id))
            .map(|name| format!(" ({})", name))
            .unwrap_or_default();
        writeln!(out, "{}", rate_line(&summary, &name))?;
    }

    let load = analysis.bus_load();
    writeln!(out, "\n--- Bus Load Analysis ---")?;
    writeln!(out, "Log duration:       {:.3} seconds", load.duration_s)?;
    writeln!(out, "Total bits sent:    {} bits", load.total_bits)?;
    writeln!(out, "Bus bit rate:       {} Mbps", load.bus_rate_mbps)?;
    writeln!(out, "Estimated Bus Load: {:.2}%", load.load_percent)?;

    if analysis.stats.negative_deltas() > 0 {
        writeln!(
            out,
            "\nNote: {} out-of-order timestamps were included in the jitter figures",
            analysis.stats.negative_deltas()
        )?;
    }
    write_malformed(out, analysis)?;

    Ok(())
}

fn rate_line(summary: &IdentifierSummary, name: &str) -> String {
    let mut line = format!(
        "CAN ID 0x{:08X}{}: Count={:<5} Avg Rate={:>7.2} Hz",
        summary.can_id, name, summary.count, summary.average_rate_hz
    );
    if summary.jitter_samples >= 2 {
        line.push_str(&format!("  Jitter={:>8.3} ms", summary.jitter_std_dev_s * 1000.0));
    }
    line
}

fn write_malformed<W: Write>(out: &mut W, analysis: &Analysis) -> Result<()> {
    if analysis.malformed_lines > 0 {
        writeln!(out, "\nMalformed lines skipped: {}", analysis.malformed_lines)?;
    }
    Ok(())
}

/// Write the targeted packet listing; returns the number of matching frames
pub fn write_text_packets<W, I>(out: &mut W, target_label: &str, packets: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = can_trace_analyzer::Result<PacketMatch>>,
{
    writeln!(out, "\n--- Data Packets for CAN ID {} ---", target_label)?;

    let mut count = 0;
    for packet in packets {
        let packet = packet?;
        writeln!(out, "{}", packet.record.line)?;
        if let Some(decoded) = &packet.decoded {
            writeln!(out, "    └─ Decoded: {}", describe_decoded(decoded))?;
        }
        count += 1;
    }

    if count == 0 {
        writeln!(out, "(no frames with this identifier)")?;
    }
    Ok(count)
}

fn describe_decoded(decoded: &std::result::Result<Vec<DecodedSignal>, DecodeFailure>) -> String {
    match decoded {
        Ok(signals) => signals
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Err(failure) => format!("[{}]", failure),
    }
}

/// JSON form of the report
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub file: String,
    pub dialect: String,
    pub capture_start: Option<String>,
    pub lines_read: usize,
    pub malformed_lines: usize,
    pub identifiers: Vec<JsonIdentifier>,
    pub bus_load: BusLoad,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets: Option<Vec<JsonPacket>>,
}

#[derive(Debug, Serialize)]
pub struct JsonIdentifier {
    pub id_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_name: Option<String>,
    #[serde(flatten)]
    pub summary: IdentifierSummary,
}

#[derive(Debug, Serialize)]
pub struct JsonPacket {
    pub line_number: usize,
    pub timestamp: f64,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl From<&PacketMatch> for JsonPacket {
    fn from(packet: &PacketMatch) -> Self {
        let (decoded, decode_error) = match &packet.decoded {
            Some(Ok(signals)) => (Some(signals.iter().map(|s| s.to_string()).collect()), None),
            Some(Err(failure)) => (None, Some(failure.to_string())),
            None => (None, None),
        };

        Self {
            line_number: packet.record.line_number,
            timestamp: packet.record.frame.timestamp,
            data: packet
                .record
                .frame
                .data
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" "),
            decoded,
            decode_error,
        }
    }
}

/// Build the JSON report
pub fn json_report(
    path: &Path,
    analysis: &Analysis,
    decoder: Option<&dyn SignalDecoder>,
    packets: Option<&[PacketMatch]>,
) -> JsonReport {
    let identifiers = analysis
        .summaries()
        .into_values()
        .map(|summary| JsonIdentifier {
            id_hex: format!("0x{:X}", summary.can_id),
            message_name: decoder
                .and_then(|d| d.message_name(summary.can_id))
                .map(str::to_string),
            summary,
        })
        .collect();

    JsonReport {
        file: path.display().to_string(),
        dialect: analysis.dialect.to_string(),
        capture_start: analysis.capture_start().map(|t| t.to_rfc3339()),
        lines_read: analysis.lines_read,
        malformed_lines: analysis.malformed_lines,
        identifiers,
        bus_load: analysis.bus_load(),
        packets: packets.map(|packets| packets.iter().map(JsonPacket::from).collect()),
    }
}

pub fn write_json<W: Write>(out: &mut W, report: &JsonReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_trace_analyzer::{Analyzer, LogDialect, SignalValue, TraceRecord};
    use std::io::Cursor;

    const LOG: &str = "\
(1623456789.000000) can0 123#0102
(1623456789.010000) can0 7FF#
(1623456789.020000) can0 123#0102
(1623456789.030000) can0 123#0102
(1623456789.035000) can0 QQQ#00
";

    struct Names;

    impl SignalDecoder for Names {
        fn decode(&self, can_id: u32, _data: &[u8]) -> std::result::Result<Vec<DecodedSignal>, DecodeFailure> {
            Err(DecodeFailure::IdentifierUnknown(can_id))
        }

        fn message_name(&self, can_id: u32) -> Option<&str> {
            (can_id == 0x123).then_some("EngineData")
        }
    }

    fn analysis() -> Analysis {
        Analyzer::default()
            .analyze_reader(Cursor::new(LOG), LogDialect::CandumpAsc)
            .unwrap()
    }

    fn render(analysis: &Analysis, decoder: Option<&dyn SignalDecoder>) -> String {
        let mut out = Vec::new();
        write_text_summary(&mut out, analysis, decoder).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_summary() {
        let text = render(&analysis(), Some(&Names));

        assert!(text.starts_with("Detected file type: candump_asc\n"));
        assert!(text.contains("Capture start:"));
        assert!(text.contains("CAN ID 0x00000123 (EngineData): Count=3"));
        assert!(text.contains("Jitter="));
        assert!(text.contains("CAN ID 0x000007FF: Count=1     Avg Rate=   0.00 Hz\n"));
        assert!(text.contains("Total bits sent:    "));
        assert!(text.contains("Malformed lines skipped: 1"));

        let first = text.find("0x00000123").unwrap();
        let second = text.find("0x000007FF").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_no_data_report() {
        let empty = Analyzer::default()
            .analyze_reader(Cursor::new(";$FILEVERSION=1.1\n"), LogDialect::Trc)
            .unwrap();
        let text = render(&empty, None);
        assert!(text.contains("No valid CAN data parsed."));
        assert!(!text.contains("Bus Load"));
    }

    #[test]
    fn test_packet_listing() {
        let record = TraceRecord {
            line_number: 1,
            line: "(1623456789.000000) can0 123#0102".to_string(),
            frame: can_trace_analyzer::Frame {
                timestamp: 1623456789.0,
                can_id: 0x123,
                dlc: 2,
                is_extended: false,
                data: vec![0x01, 0x02],
            },
        };
        let decoded = vec![DecodedSignal {
            name: "EngineSpeed".to_string(),
            value: SignalValue::Integer(513),
            unit: Some("rpm".to_string()),
            raw_value: 513,
        }];
        let packets = vec![
            Ok(PacketMatch {
                record: record.clone(),
                decoded: Some(Ok(decoded)),
            }),
            Ok(PacketMatch {
                record,
                decoded: Some(Err(DecodeFailure::IdentifierUnknown(0x123))),
            }),
        ];

        let mut out = Vec::new();
        let count = write_text_packets(&mut out, "123", packets).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(count, 2);
        assert!(text.contains("--- Data Packets for CAN ID 123 ---"));
        assert!(text.contains("    └─ Decoded: EngineSpeed: 513 rpm\n"));
        assert!(text.contains("    └─ Decoded: [ID 0x123 not found in message database]"));
    }

    #[test]
    fn test_json_report() {
        let analysis = analysis();
        let report = json_report(Path::new("trace.log"), &analysis, Some(&Names), None);
        let mut out = Vec::new();
        write_json(&mut out, &report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["dialect"], "candump_asc");
        assert_eq!(value["malformed_lines"], 1);
        assert_eq!(value["identifiers"][0]["id_hex"], "0x123");
        assert_eq!(value["identifiers"][0]["message_name"], "EngineData");
        assert_eq!(value["identifiers"][0]["count"], 3);
        assert!(value["identifiers"][1].get("message_name").is_none());
        assert!(value.get("packets").is_none());
        assert_eq!(value["bus_load"]["bus_rate_mbps"], 1.0);
    }
}
