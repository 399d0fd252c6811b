// PacketSleuth - app/scan.rs
//
// Streaming scan of one extracted log file: read line by line, parse each
// line, keep the ones the criteria accept.
//
// Memory: one reused line buffer plus the accepted entries. The file is never
// loaded whole.
//
// Failure policy:
//   - Cannot open the file: ScanError, the caller skips the file.
//   - Read error part-way through: stop, keep what was accepted so far, and
//     report the error in `ScanOutcome::interrupted`.

use crate::core::filter::FilterCriteria;
use crate::core::model::{LogEntry, SourceLocation};
use crate::core::parser;
use crate::util::constants;
use crate::util::error::ScanError;
use crate::util::logging::preview;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Result of scanning one file (or reader).
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted entries, in file order.
    pub entries: Vec<LogEntry>,

    /// Lines read, including skipped empty lines.
    pub lines_read: u64,

    /// Earliest accepted timestamp.
    pub earliest: Option<DateTime<Utc>>,

    /// Latest accepted timestamp.
    pub latest: Option<DateTime<Utc>>,

    /// Set when reading stopped early because of an I/O error.
    pub interrupted: Option<io::Error>,

    /// Set when the entry limit stopped the scan early.
    pub limit_reached: bool,
}

/// Scan a file, labelling entries with the file's own name.
pub fn scan_file(path: &Path, criteria: &FilterCriteria) -> Result<ScanOutcome, ScanError> {
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    scan_file_as(path, &source_name, criteria, constants::DEFAULT_MAX_RESULTS)
}

/// Scan a file, labelling entries with `source_name` (the archive entry name)
/// and accepting at most `max_entries` matches.
pub fn scan_file_as(
    path: &Path,
    source_name: &str,
    criteria: &FilterCriteria,
    max_entries: usize,
) -> Result<ScanOutcome, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::with_capacity(constants::DEFAULT_READ_BUFFER_SIZE, file);
    Ok(scan_reader(reader, source_name, criteria, max_entries))
}

/// Scan any buffered reader. Never fails: a read error ends the scan and is
/// returned in `interrupted` alongside the entries accepted before it.
pub fn scan_reader<R: BufRead>(
    mut reader: R,
    source_name: &str,
    criteria: &FilterCriteria,
    max_entries: usize,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let mut buf: Vec<u8> = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    source = source_name,
                    lines = outcome.lines_read,
                    error = %e,
                    "Read interrupted"
                );
                outcome.interrupted = Some(e);
                break;
            }
        }
        outcome.lines_read += 1;

        strip_terminator(&mut buf);
        if buf.is_empty() {
            continue;
        }

        let raw = String::from_utf8_lossy(&buf);
        let entry = parser::parse_line(&raw).with_location(SourceLocation {
            source: source_name.to_string(),
            line: outcome.lines_read,
        });

        if !criteria.matches(&entry) {
            continue;
        }

        if outcome.entries.len() >= max_entries {
            outcome.limit_reached = true;
            break;
        }

        tracing::trace!(
            source = source_name,
            line = outcome.lines_read,
            text = preview(&entry.raw),
            "Entry matched"
        );

        if let Some(ts) = entry.timestamp {
            outcome.earliest = Some(outcome.earliest.map_or(ts, |e| e.min(ts)));
            outcome.latest = Some(outcome.latest.map_or(ts, |l| l.max(ts)));
        }
        outcome.entries.push(entry);
    }

    outcome
}

/// Remove a trailing `\n` or `\r\n`.
fn strip_terminator(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    const SAMPLE: &str = "2024-01-01T10:00:00Z INFO user=alice hello\n\
                          \n\
                          2024-01-01T11:00:00Z ERROR user=bob trouble\r\n\
                          continuation without structure\n";

    fn scan_str(text: &str, criteria: &FilterCriteria) -> ScanOutcome {
        scan_reader(Cursor::new(text.as_bytes()), "test.log", criteria, usize::MAX)
    }

    /// Yields `data`, then fails every subsequent read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                Err(io::Error::other("device went away"))
            } else {
                Ok(n)
            }
        }
    }

    #[test]
    fn test_scan_all_with_empty_criteria() {
        let outcome = scan_str(SAMPLE, &FilterCriteria::default());
        assert_eq!(outcome.lines_read, 4);
        assert_eq!(outcome.entries.len(), 3);
        assert!(outcome.interrupted.is_none());
        assert!(!outcome.limit_reached);
    }

    #[test]
    fn test_line_numbers_count_skipped_lines() {
        let outcome = scan_str(SAMPLE, &FilterCriteria::default());
        let lines: Vec<u64> = outcome
            .entries
            .iter()
            .map(|e| e.location.as_ref().unwrap().line)
            .collect();
        assert_eq!(lines, vec![1, 3, 4]);
        assert_eq!(outcome.entries[0].location.as_ref().unwrap().source, "test.log");
    }

    #[test]
    fn test_crlf_stripped_from_raw() {
        let outcome = scan_str(SAMPLE, &FilterCriteria::default());
        assert_eq!(
            outcome.entries[1].raw,
            "2024-01-01T11:00:00Z ERROR user=bob trouble"
        );
    }

    #[test]
    fn test_filter_applied_in_file_order() {
        let criteria = FilterCriteria {
            substring: Some("o".to_string()),
            ..Default::default()
        };
        let outcome = scan_str(SAMPLE, &criteria);
        let users: Vec<_> = outcome
            .entries
            .iter()
            .map(|e| e.user.clone())
            .collect();
        assert_eq!(
            users,
            vec![Some("alice".to_string()), Some("bob".to_string()), None]
        );
    }

    #[test]
    fn test_timestamp_range_tracked() {
        let outcome = scan_str(SAMPLE, &FilterCriteria::default());
        assert_eq!(
            outcome.earliest.unwrap().to_rfc3339(),
            "2024-01-01T10:00:00+00:00"
        );
        assert_eq!(
            outcome.latest.unwrap().to_rfc3339(),
            "2024-01-01T11:00:00+00:00"
        );
    }

    #[test]
    fn test_invalid_utf8_decoded_lossily() {
        let bytes = b"ERROR bad \xff byte\n".to_vec();
        let outcome = scan_reader(
            Cursor::new(bytes),
            "bin.log",
            &FilterCriteria::default(),
            usize::MAX,
        );
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].level.as_deref(), Some("ERROR"));
        assert!(outcome.entries[0].raw.contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_error_keeps_partial_result() {
        let reader = BufReader::new(FailingReader {
            data: Cursor::new(b"INFO first\nINFO second\npartial".to_vec()),
        });
        let outcome = scan_reader(reader, "flaky.log", &FilterCriteria::default(), usize::MAX);
        assert!(outcome.interrupted.is_some());
        let messages: Vec<_> = outcome.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_limit_stops_scan() {
        let outcome = scan_reader(
            Cursor::new(SAMPLE.as_bytes()),
            "test.log",
            &FilterCriteria::default(),
            2,
        );
        assert_eq!(outcome.entries.len(), 2);
        assert!(outcome.limit_reached);
    }

    #[test]
    fn test_scan_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_file(&dir.path().join("gone.log"), &FilterCriteria::default());
        assert!(matches!(result, Err(ScanError::Open { .. })));
    }

    #[test]
    fn test_scan_file_labels_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mattermost.log");
        std::fs::write(&path, SAMPLE).unwrap();
        let outcome = scan_file(&path, &FilterCriteria::default()).unwrap();
        assert_eq!(outcome.entries.len(), 3);
        assert_eq!(
            outcome.entries[2].location.as_ref().unwrap().to_string(),
            "mattermost.log:4"
        );
    }
}
