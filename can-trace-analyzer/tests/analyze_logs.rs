//! End-to-end analysis of small trace files in every supported dialect

use can_trace_analyzer::{
    Analyzer, AnalyzerConfig, AnalyzerError, DbcSignalDecoder, DecodeFailure, LogDialect,
    SignalValue,
};
use std::io::Write;
use tempfile::NamedTempFile;

const TRC_LOG: &str = "\
;$FILEVERSION=1.1
;$STARTTIME=44360.4253550347
;
;   Message Number
;   |         Time Offset (ms)
;   |         |        Type
;   |         |        |        ID (hex)
;   |         |        |        |     Data Length
;---+--   ----+----  --+--  ----+---  +  -+ -- -- -- -- -- -- --
     1)         0.0  Rx          456  2  AA BB
     2)        10.0  Rx          123  8  01 02 03 04 05 06 07 08
     3)        20.0  Rx          123  8  01 02 03 04 05 06 07 08
     4)        25.0  Rx          456  2  AA BB
     5)        30.0  Rx          123  8  01 02 03 04 05 06 07 08
";

const CANDUMP_LOG: &str = "\
(1623456789.000000) can0 456#AABB
(1623456789.010000) can0 123#0102030405060708
(1623456789.020000) can0 123#0102030405060708
(1623456789.025000) can0 456#AABB
(1623456789.030000) can0 123#0102030405060708
";

const VECTOR_LOG: &str = "\
date Wed Jun 12 10:15:32.123 am 2024
base hex  timestamps absolute
internal events logged
Begin Triggerblock Wed Jun 12 10:15:32.123 am 2024
   0.000000 Start of measurement
   0.000000 1  456             Rx   d 2 AA BB
   0.010000 1  123             Rx   d 8 01 02 03 04 05 06 07 08
   0.020000 1  123             Rx   d 8 01 02 03 04 05 06 07 08
   0.025000 1  456             Rx   d 2 AA BB
   0.030000 1  123             Rx   d 8 01 02 03 04 05 06 07 08
End TriggerBlock
";

const ENGINE_DBC: &str = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    BA_
    VAL_
    CAT_DEF_
    CAT_
    FILTER
    BA_DEF_DEF_
    EV_DATA_
    ENVVAR_DATA_
    SGTYPE_
    SGTYPE_VAL_
    BA_DEF_SGTYPE_
    BA_SGTYPE_
    SIG_TYPE_REF_
    VAL_TABLE_
    SIG_GROUP_
    SIG_VALTYPE_
    SIGTYPE_VALTYPE_
    BO_TX_BU_
    BA_DEF_REL_
    BA_REL_
    BA_SGTYPE_REL_
    SG_MUL_VAL_

BS_:

BU_: ECU1 ECU2

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|65535] "rpm" ECU2
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_fixture(content: &str) -> NamedTempFile {
    init_logging();
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn assert_reference_counts(content: &str, expected: LogDialect) {
    let fixture = write_fixture(content);
    let analyzer = Analyzer::default();

    assert_eq!(analyzer.detect(fixture.path()).unwrap(), expected);

    let analysis = analyzer.analyze_file(fixture.path()).unwrap();
    assert_eq!(analysis.dialect, expected);
    assert_eq!(analysis.malformed_lines, 0);

    let summaries = analysis.summaries();
    assert_eq!(summaries.keys().copied().collect::<Vec<_>>(), vec![0x123, 0x456]);
    assert_eq!(summaries[&0x123].count, 3);
    assert_eq!(summaries[&0x456].count, 2);

    // 0x123 arrives at 10, 20 and 30 ms; epoch timestamps leave only rounding noise
    assert!((summaries[&0x123].average_rate_hz - 100.0).abs() < 0.01);
    assert!(summaries[&0x123].jitter_std_dev_s < 1e-5);
    assert_eq!(summaries[&0x123].jitter_samples, 2);
    assert_eq!(summaries[&0x456].jitter_samples, 1);
    assert_eq!(summaries[&0x456].jitter_std_dev_s, 0.0);

    // 132 bits per 8-byte frame, 72 per 2-byte frame
    let load = analysis.bus_load();
    assert_eq!(load.total_bits, 3 * 132 + 2 * 72);
    assert!((load.duration_s - 0.030).abs() < 1e-5);
    assert!((load.load_percent - 1.8).abs() < 1e-3);
}

#[test]
fn test_trc_reference_counts() {
    assert_reference_counts(TRC_LOG, LogDialect::Trc);
}

#[test]
fn test_candump_reference_counts() {
    assert_reference_counts(CANDUMP_LOG, LogDialect::CandumpAsc);
}

#[test]
fn test_vector_reference_counts() {
    assert_reference_counts(VECTOR_LOG, LogDialect::VectorAsc);
}

#[test]
fn test_capture_start_only_for_epoch_timestamps() {
    let analyzer = Analyzer::default();

    let candump = write_fixture(CANDUMP_LOG);
    let start = analyzer.analyze_file(candump.path()).unwrap().capture_start();
    assert_eq!(start.map(|t| t.timestamp()), Some(1_623_456_789));

    let vector = write_fixture(VECTOR_LOG);
    assert!(analyzer.analyze_file(vector.path()).unwrap().capture_start().is_none());
}

#[test]
fn test_malformed_lines_are_counted_not_fatal() {
    let log = "\
(1.000000) can0 123#0102
(1.100000) can0 XYZ#0102
(1.200000) can0 123#01020304050607080910
(1.300000) can0 123#0102
";
    let fixture = write_fixture(log);
    let analyzer = Analyzer::new(AnalyzerConfig::new().with_malformed_warnings(false));
    let analysis = analyzer.analyze_file(fixture.path()).unwrap();

    assert_eq!(analysis.lines_read, 4);
    assert_eq!(analysis.malformed_lines, 2);
    assert_eq!(analysis.summaries()[&0x123].count, 2);
}

#[test]
fn test_empty_file_is_unknown_dialect() {
    let fixture = write_fixture("");
    let result = Analyzer::default().analyze_file(fixture.path());
    assert!(matches!(result, Err(AnalyzerError::UnknownDialect(_))));
}

#[test]
fn test_header_only_trace_has_no_data() {
    let fixture = write_fixture(";$FILEVERSION=1.1\n;$STARTTIME=44360.4253550347\n");
    let analysis = Analyzer::default().analyze_file(fixture.path()).unwrap();

    assert!(analysis.is_empty());
    assert!(analysis.summaries().is_empty());
    assert_eq!(analysis.bus_load().load_percent, 0.0);
    assert!(analysis.capture_start().is_none());
}

#[test]
fn test_missing_file() {
    let result = Analyzer::default().analyze_file(std::path::Path::new("/nonexistent/trace.trc"));
    assert!(matches!(result, Err(AnalyzerError::FileOpen { .. })));
}

#[test]
fn test_unrecognised_content() {
    let fixture = write_fixture("hello world\nthis is not a trace\n");
    let result = Analyzer::default().detect(fixture.path());
    assert!(matches!(result, Err(AnalyzerError::UnknownDialect(_))));
}

#[test]
fn test_filter_without_decoder() {
    let fixture = write_fixture(VECTOR_LOG);
    let analyzer = Analyzer::default();

    let packets: Vec<_> = analyzer
        .filter_file(fixture.path(), LogDialect::VectorAsc, 0x456)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].record.line_number, 6);
    assert_eq!(packets[1].record.line_number, 9);
    assert_eq!(packets[0].record.frame.data, vec![0xAA, 0xBB]);
    assert!(packets.iter().all(|p| p.decoded.is_none()));
}

#[test]
fn test_filter_with_dbc_decoder() {
    let dbc = write_fixture(ENGINE_DBC);
    let trace = write_fixture(CANDUMP_LOG);
    let decoder = DbcSignalDecoder::from_dbc_file(dbc.path()).unwrap();
    let analyzer = Analyzer::default().with_signal_decoder(Box::new(decoder));

    let packets: Vec<_> = analyzer
        .filter_file(trace.path(), LogDialect::CandumpAsc, 0x123)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(packets.len(), 3);

    let signals = packets[0].decoded.clone().unwrap().unwrap();
    assert_eq!(signals[0].name, "EngineSpeed");
    assert_eq!(signals[0].value, SignalValue::Integer(0x0201));
    assert_eq!(signals[0].unit.as_deref(), Some("rpm"));

    let others: Vec<_> = analyzer
        .filter_file(trace.path(), LogDialect::CandumpAsc, 0x456)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        others[0].decoded,
        Some(Err(DecodeFailure::IdentifierUnknown(0x456)))
    );
}
