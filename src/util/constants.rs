// PacketSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "PacketSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "PacketSleuth";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Support packet layout
// =============================================================================

/// Base name of the server's primary log file. Any archive entry whose name
/// ends with this is treated as log-bearing.
pub const LOG_FILE_NAME: &str = "mattermost.log";

/// Logs-directory marker in forward-slash form.
pub const LOGS_DIR_MARKER: &str = "/logs/";

/// Logs-directory marker in backslash form (packets produced on Windows).
pub const LOGS_DIR_MARKER_BACKSLASH: &str = "\\logs\\";

/// Prefix of the run-scoped scratch directory.
pub const SCRATCH_DIR_PREFIX: &str = "packetsleuth_support_packet";

// =============================================================================
// Parsing
// =============================================================================

/// Read buffer capacity for streaming log files.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

/// Severity words recognised by the plain-text level extractor.
/// Compared case-insensitively; the original token is preserved.
pub const KNOWN_LEVELS: &[&str] = &[
    "TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "ERR", "FATAL", "CRITICAL", "CRIT",
    "PANIC",
];

/// `key=value` keys that carry a user identifier in plain-text lines.
pub const USER_KEYS: &[&str] = &["user", "user_id", "userid"];

/// JSON keys probed (in order) for each field of a JSON-lines record.
pub const JSON_TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "ts"];
pub const JSON_LEVEL_KEYS: &[&str] = &["level"];
pub const JSON_USER_KEYS: &[&str] = &["user_id", "userId", "user"];
pub const JSON_MESSAGE_KEYS: &[&str] = &["msg", "message"];

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Result limits
// =============================================================================

/// Default cap on matched entries held in memory for one run.
///
/// When the cap is reached the pipeline stops ingesting and reports the
/// result as truncated. Narrow the criteria to see the rest.
pub const DEFAULT_MAX_RESULTS: usize = 1_000_000;

/// Minimum user-configurable result cap.
pub const MIN_MAX_RESULTS: usize = 1;

/// Maximum user-configurable result cap.
pub const ABSOLUTE_MAX_RESULTS: usize = 10_000_000;

/// Maximum number of non-fatal warnings kept in a run report. Further
/// warnings are still logged.
pub const MAX_WARNINGS: usize = 1_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
