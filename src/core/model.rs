// PacketSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::{ExtractionError, ScanError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io;

// =============================================================================
// Log Entry (normalised output of parsing)
// =============================================================================

/// A single parsed log line.
///
/// Every derived field is best-effort: `None` means the line did not encode
/// that dimension in a recognisable form, never that parsing failed. `raw`
/// always carries the original line (terminator stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Parsed timestamp in UTC.
    pub timestamp: Option<DateTime<Utc>>,

    /// Severity token exactly as written in the line (e.g. "ERROR", "error").
    pub level: Option<String>,

    /// User or session identifier extracted from the line.
    pub user: Option<String>,

    /// Free-text payload once the recognised prefix is removed.
    pub message: String,

    /// Original unparsed line.
    pub raw: String,

    /// Where the line came from. Set by the file scanner.
    pub location: Option<SourceLocation>,
}

impl LogEntry {
    /// Attach the archive entry name and line number this entry was read from.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Origin of a log entry inside the support packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Archive entry name (full path inside the packet).
    pub source: String,

    /// 1-based line number within that entry.
    pub line: u64,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

// =============================================================================
// Archive entries
// =============================================================================

/// One entry of a support packet, as enumerated from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in archive enumeration order.
    pub index: usize,

    /// Path inside the archive. Either `/` or `\` may separate components,
    /// depending on the platform that produced the packet.
    pub name: String,
}

impl ArchiveEntry {
    /// Whether this entry carries server logs: its name ends with the server
    /// log file name, or it sits under a `logs` directory (either separator).
    pub fn is_log_bearing(&self) -> bool {
        self.name.ends_with(constants::LOG_FILE_NAME)
            || self.name.contains(constants::LOGS_DIR_MARKER)
            || self.name.contains(constants::LOGS_DIR_MARKER_BACKSLASH)
    }

    /// Last path component, splitting on both separators. Trailing
    /// separators (directory entries) are ignored.
    pub fn base_name(&self) -> &str {
        let is_sep = |c: char| c == '/' || c == '\\';
        self.name
            .trim_end_matches(is_sep)
            .rsplit(is_sep)
            .next()
            .unwrap_or("")
    }
}

// =============================================================================
// Run results
// =============================================================================

/// Per-file scan statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// Archive entry name.
    pub entry_name: String,

    /// Non-terminator lines read (including empty and non-matching ones).
    pub lines_read: u64,

    /// Entries that passed the filter.
    pub matched: usize,

    /// Earliest matched timestamp (if any).
    pub earliest: Option<DateTime<Utc>>,

    /// Latest matched timestamp (if any).
    pub latest: Option<DateTime<Utc>>,
}

/// A non-fatal problem recovered from during a run.
#[derive(Debug)]
pub enum RunWarning {
    /// An entry could not be materialised; it was skipped.
    Extraction(ExtractionError),

    /// An extracted file could not be opened; it was skipped.
    Scan(ScanError),

    /// Reading stopped part-way through a file. Entries read before the
    /// failure were kept.
    PartialRead {
        entry: String,
        lines_read: u64,
        source: io::Error,
    },

    /// The result cap was reached; remaining lines and files were not scanned.
    ResultLimitReached { max_results: usize },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(e) => write!(f, "Failed to extract {e}"),
            Self::Scan(e) => write!(f, "Failed to parse {e}"),
            Self::PartialRead {
                entry,
                lines_read,
                source,
            } => write!(
                f,
                "'{entry}': read stopped after {lines_read} lines: {source}; partial results kept"
            ),
            Self::ResultLimitReached { max_results } => write!(
                f,
                "Result limit of {max_results} entries reached; narrow the criteria to see the rest"
            ),
        }
    }
}

/// Outcome of one pipeline run over a support packet.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Matching entries in entry-processing order, file order within each entry.
    pub entries: Vec<LogEntry>,

    /// One summary per file that was scanned (fully or partially).
    pub files: Vec<FileSummary>,

    /// Recovered failures, capped at `MAX_WARNINGS`.
    pub warnings: Vec<RunWarning>,

    /// Warnings logged but not kept because the cap was hit.
    pub warnings_dropped: usize,

    /// Number of archive entries selected as log-bearing.
    pub selected_entries: usize,

    /// Whether the result cap stopped the run early.
    pub truncated: bool,

    /// Wall-clock run duration.
    pub duration: std::time::Duration,
}

impl RunReport {
    /// True when the run completed without producing a single match.
    /// Distinct from an aborted run, which never yields a report.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a warning, respecting the warning cap.
    pub fn push_warning(&mut self, warning: RunWarning) {
        if self.warnings.len() < constants::MAX_WARNINGS {
            self.warnings.push(warning);
        } else {
            self.warnings_dropped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: &str) -> LogEntry {
        LogEntry {
            timestamp: None,
            level: None,
            user: None,
            message: raw.to_string(),
            raw: raw.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_with_location_sets_source_and_line() {
        let e = entry("hello").with_location(SourceLocation {
            source: "logs/mattermost.log".to_string(),
            line: 7,
        });
        let loc = e.location.unwrap();
        assert_eq!(loc.to_string(), "logs/mattermost.log:7");
    }

    fn archive_entry(name: &str) -> ArchiveEntry {
        ArchiveEntry {
            index: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_log_bearing_names() {
        assert!(archive_entry("a/logs/x.log").is_log_bearing());
        assert!(archive_entry("b\\logs\\y.log").is_log_bearing());
        assert!(archive_entry("mattermost.log").is_log_bearing());
        assert!(archive_entry("node1/mattermost.log").is_log_bearing());
        assert!(!archive_entry("readme.txt").is_log_bearing());
        assert!(!archive_entry("config/config.json").is_log_bearing());
        // Marker requires a leading separator.
        assert!(!archive_entry("logs/top.log").is_log_bearing());
    }

    #[test]
    fn test_base_name_both_separators() {
        assert_eq!(archive_entry("a/logs/x.log").base_name(), "x.log");
        assert_eq!(archive_entry("b\\logs\\y.log").base_name(), "y.log");
        assert_eq!(archive_entry("mixed/dir\\z.log").base_name(), "z.log");
        assert_eq!(archive_entry("mattermost.log").base_name(), "mattermost.log");
        assert_eq!(archive_entry("a/logs/").base_name(), "logs");
        assert_eq!(archive_entry("/").base_name(), "");
    }

    #[test]
    fn test_report_warning_cap() {
        let mut report = RunReport::default();
        for _ in 0..constants::MAX_WARNINGS + 5 {
            report.push_warning(RunWarning::ResultLimitReached { max_results: 1 });
        }
        assert_eq!(report.warnings.len(), constants::MAX_WARNINGS);
        assert_eq!(report.warnings_dropped, 5);
    }

    #[test]
    fn test_empty_report() {
        let mut report = RunReport::default();
        assert!(report.is_empty());
        report.entries.push(entry("x"));
        assert!(!report.is_empty());
    }
}
