// PacketSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Fatal vs recoverable:
//   - PacketError is what aborts a run (archive open, scratch setup, bad
//     criteria) or the CLI (export).
//   - ExtractionError and ScanError are per-file and never abort a run; the
//     pipeline records them as warnings and moves on.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all PacketSleuth operations.
#[derive(Debug)]
pub enum PacketError {
    /// The support packet could not be opened as a ZIP container.
    ArchiveOpen { path: PathBuf, source: ArchiveError },

    /// The run-scoped scratch directory could not be created.
    ScratchSetup { root: PathBuf, source: io::Error },

    /// Filter criteria are invalid (bad regex, bad timestamp).
    Filter(FilterError),

    /// Rendering results failed.
    Export(ExportError),
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArchiveOpen { path, source } => {
                write!(
                    f,
                    "Failed to open support packet '{}': {source}",
                    path.display()
                )
            }
            Self::ScratchSetup { root, source } => write!(
                f,
                "Failed to create scratch directory under '{}': {source}",
                root.display()
            ),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
        }
    }
}

impl std::error::Error for PacketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ArchiveOpen { source, .. } => Some(source),
            Self::ScratchSetup { source, .. } => Some(source),
            Self::Filter(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Archive errors
// ---------------------------------------------------------------------------

/// Why a support packet could not be opened.
#[derive(Debug)]
pub enum ArchiveError {
    /// The file itself could not be opened.
    Io(io::Error),

    /// The file is not a readable ZIP container.
    Zip(zip::result::ZipError),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Zip(e) => write!(f, "not a valid ZIP archive: {e}"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Zip(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Failure to materialise one archive entry into scratch storage.
#[derive(Debug)]
pub enum ExtractionError {
    /// The entry's base name is empty, `.` or `..` and cannot be placed
    /// inside the scratch directory.
    UnsafeName { entry: String },

    /// The entry's byte stream could not be opened.
    Open { entry: String, source: io::Error },

    /// The destination file could not be created.
    Create {
        entry: String,
        path: PathBuf,
        source: io::Error,
    },

    /// Copying the entry's bytes failed part-way, e.g. on a CRC mismatch.
    Copy {
        entry: String,
        path: PathBuf,
        source: io::Error,
    },
}

impl ExtractionError {
    /// Name of the archive entry that failed.
    pub fn entry(&self) -> &str {
        match self {
            Self::UnsafeName { entry }
            | Self::Open { entry, .. }
            | Self::Create { entry, .. }
            | Self::Copy { entry, .. } => entry,
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsafeName { entry } => {
                write!(f, "'{entry}': entry name has no usable file name")
            }
            Self::Open { entry, source } => {
                write!(f, "'{entry}': cannot open entry: {source}")
            }
            Self::Create {
                entry,
                path,
                source,
            } => write!(
                f,
                "'{entry}': cannot create '{}': {source}",
                path.display()
            ),
            Self::Copy {
                entry,
                path,
                source,
            } => write!(
                f,
                "'{entry}': failed writing '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Create { source, .. } => Some(source),
            Self::Copy { source, .. } => Some(source),
            Self::UnsafeName { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Failure to scan an extracted log file.
///
/// Only opening the file is an error; a read failure after that point yields
/// a partial result instead (see `app::scan::ScanOutcome::interrupted`).
#[derive(Debug)]
pub enum ScanError {
    /// The file could not be opened.
    Open { path: PathBuf, source: io::Error },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "'{}': cannot open for scanning: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors building filter criteria. All of these are configuration mistakes
/// and are reported before any archive work starts.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// User-provided regex exceeds the maximum allowed length.
    RegexTooLong { length: usize, max_length: usize },

    /// A time bound could not be parsed.
    InvalidTimestamp { field: &'static str, value: String },

    /// The start bound is after the end bound.
    InvertedTimeRange { start: String, end: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
            Self::RegexTooLong { length, max_length } => write!(
                f,
                "Filter regex is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::InvalidTimestamp { field, value } => write!(
                f,
                "Cannot parse {field} time '{value}'. \
                 Expected RFC 3339 (2024-01-01T10:00:00Z), \
                 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'"
            ),
            Self::InvertedTimeRange { start, end } => {
                write!(f, "Start time '{start}' is after end time '{end}'")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FilterError> for PacketError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to rendering results.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing output.
    Io(io::Error),

    /// CSV serialisation error.
    Csv(csv::Error),

    /// JSON serialisation error.
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "output I/O error: {e}"),
            Self::Csv(e) => write!(f, "CSV output error: {e}"),
            Self::Json(e) => write!(f, "JSON output error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<ExportError> for PacketError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading. These never abort the program;
/// the config loader turns them into warnings and falls back to defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for PacketSleuth results.
pub type Result<T> = std::result::Result<T, PacketError>;
