//! Log dialect detection
//!
//! Looks at the first non-empty lines of a trace and classifies it by the
//! first line that carries a dialect marker. Lines without a marker are
//! treated as free-form headers and skipped.

use crate::types::LogDialect;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Classify a single (trimmed, non-empty) line, if it carries a marker
fn classify_line(line: &str) -> Option<LogDialect> {
    if line.starts_with(';') {
        return Some(LogDialect::Trc);
    }
    if line.starts_with('(') {
        return Some(LogDialect::CandumpAsc);
    }

    let mut tokens = line.split_whitespace();
    let leading_float = tokens
        .next()
        .map(|first| first.parse::<f64>().is_ok())
        .unwrap_or(false);
    if leading_float && tokens.count() >= 5 {
        return Some(LogDialect::VectorAsc);
    }

    None
}

/// Detect the dialect from an in-memory sequence of lines
///
/// At most `window` non-empty lines are inspected.
pub fn detect_dialect<I, S>(lines: I, window: usize) -> LogDialect
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| {
            line.as_ref()
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(window)
        .find_map(|line| classify_line(&line))
        .unwrap_or(LogDialect::Unknown)
}

/// Detect the dialect of a file on disk
///
/// A file that cannot be opened or read yields [`LogDialect::Unknown`].
pub fn detect_file(path: &Path, window: usize) -> LogDialect {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("Cannot open {:?} for dialect detection: {}", path, e);
            return LogDialect::Unknown;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut lines = Vec::new();
    let mut non_empty = 0;

    while non_empty < window {
        match super::next_line(&mut reader, &mut buf) {
            Ok(Some(line)) => {
                if !line.trim().is_empty() {
                    non_empty += 1;
                }
                lines.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("Read error during dialect detection of {:?}: {}", path, e);
                break;
            }
        }
    }

    let dialect = detect_dialect(&lines, window);
    log::debug!("Detected dialect of {:?}: {}", path, dialect);
    dialect
}
