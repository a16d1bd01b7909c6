//! Text trace dialect parsers (TRC, candump, Vector ASC)
//!
//! Each dialect is handled by one pure line-parsing function. The functions
//! are registered in a table keyed by [`LogDialect`], and [`TraceReader`]
//! drives the selected parser over a buffered reader, one line at a time.

use crate::types::{AnalyzerError, Frame, LogDialect, Result, MAX_DLC, MAX_STANDARD_ID};
use std::io::BufRead;

pub mod candump;
pub mod detect;
pub mod trc;
pub mod vector_asc;

pub use detect::{detect_dialect, detect_file};

/// Outcome of parsing one log line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// The line carried a CAN frame
    Frame(Frame),
    /// Header, comment, blank or non-frame event line
    Skip,
    /// The line has the shape of a data line but a field failed to parse
    Malformed(String),
}

impl From<std::result::Result<Frame, String>> for ParsedLine {
    fn from(result: std::result::Result<Frame, String>) -> Self {
        match result {
            Ok(frame) => ParsedLine::Frame(frame),
            Err(reason) => ParsedLine::Malformed(reason),
        }
    }
}

/// Signature shared by all dialect parsers
pub type LineParser = fn(&str) -> ParsedLine;

const PARSERS: [(LogDialect, LineParser); 3] = [
    (LogDialect::Trc, trc::parse_line as LineParser),
    (LogDialect::CandumpAsc, candump::parse_line as LineParser),
    (LogDialect::VectorAsc, vector_asc::parse_line as LineParser),
];

/// Look up the line parser for a dialect (`None` for [`LogDialect::Unknown`])
pub fn parser_for(dialect: LogDialect) -> Option<LineParser> {
    PARSERS
        .iter()
        .find(|(candidate, _)| *candidate == dialect)
        .map(|(_, parser)| *parser)
}

/// Parse a single line with the parser registered for `dialect`
pub fn parse_line(dialect: LogDialect, line: &str) -> ParsedLine {
    match parser_for(dialect) {
        Some(parser) => parser(line),
        None => ParsedLine::Skip,
    }
}

/// One successfully parsed data line
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    /// 1-based line number in the file
    pub line_number: usize,
    /// The raw line without its line terminator
    pub line: String,
    /// The frame extracted from the line
    pub frame: Frame,
}

/// Streaming frame reader over a text trace
///
/// Skipped lines are dropped silently, malformed lines are counted (and
/// logged when warnings are enabled). Only I/O failures end the stream with
/// an error.
pub struct TraceReader<R> {
    reader: R,
    parser: LineParser,
    dialect: LogDialect,
    buf: Vec<u8>,
    line_number: usize,
    malformed: usize,
    report_malformed: bool,
}

impl<R: BufRead> TraceReader<R> {
    /// Create a reader for an already detected dialect
    pub fn new(reader: R, dialect: LogDialect) -> Result<Self> {
        let parser = parser_for(dialect)
            .ok_or_else(|| AnalyzerError::UnknownDialect("<reader>".to_string()))?;

        Ok(Self {
            reader,
            parser,
            dialect,
            buf: Vec::new(),
            line_number: 0,
            malformed: 0,
            report_malformed: true,
        })
    }

    /// Builder method: enable or disable malformed-line warnings
    pub fn with_malformed_warnings(mut self, enabled: bool) -> Self {
        self.report_malformed = enabled;
        self
    }

    /// Dialect this reader parses
    pub fn dialect(&self) -> LogDialect {
        self.dialect
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Number of malformed lines skipped so far
    pub fn malformed_lines(&self) -> usize {
        self.malformed
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match next_line(&mut self.reader, &mut self.buf) {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            match (self.parser)(&line) {
                ParsedLine::Frame(frame) => {
                    return Some(Ok(TraceRecord {
                        line_number: self.line_number,
                        line,
                        frame,
                    }));
                }
                ParsedLine::Skip => {
                    log::trace!("Skipping line {}: {:?}", self.line_number, line);
                }
                ParsedLine::Malformed(reason) => {
                    self.malformed += 1;
                    if self.report_malformed {
                        log::warn!(
                            "Skipping malformed {} line {}: {}",
                            self.dialect,
                            self.line_number,
                            reason
                        );
                    }
                }
            }
        }
    }
}

/// Read one line, decoding it lossily and stripping the terminator and BOM
pub(crate) fn next_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }

    let text = String::from_utf8_lossy(buf);
    let line = text
        .trim_end_matches(['\r', '\n'])
        .trim_start_matches('\u{feff}');
    Ok(Some(line.to_string()))
}

/// Parse a hexadecimal identifier token as it appears in a log line
pub(crate) fn parse_identifier(token: &str) -> std::result::Result<u32, String> {
    crate::types::parse_can_id(token).ok_or_else(|| format!("invalid identifier '{}'", token))
}

/// Parse a decimal DLC token, rejecting values above 8
pub(crate) fn parse_dlc(token: &str) -> std::result::Result<u8, String> {
    let dlc: u8 = token
        .parse()
        .map_err(|_| format!("invalid DLC '{}'", token))?;
    if dlc > MAX_DLC {
        return Err(format!("DLC {} out of range", dlc));
    }
    Ok(dlc)
}

/// Parse a timestamp token
pub(crate) fn parse_timestamp(token: &str) -> std::result::Result<f64, String> {
    token
        .parse::<f64>()
        .ok()
        .filter(|ts| ts.is_finite())
        .ok_or_else(|| format!("invalid timestamp '{}'", token))
}

/// Collect up to `dlc` space-separated data bytes, stopping at the first
/// token that is not a two-digit hex byte (trailing annotations, `RTR`, ...)
pub(crate) fn parse_data_bytes<'a, I>(tokens: I, dlc: u8) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .map_while(|token| {
            if token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit()) {
                u8::from_str_radix(token, 16).ok()
            } else {
                None
            }
        })
        .take(usize::from(dlc))
        .collect()
}

/// Addressing mode inferred from the identifier's text width or value
pub(crate) fn is_extended_id(id_text: &str, can_id: u32) -> bool {
    id_text.len() > 3 || can_id > MAX_STANDARD_ID
}
