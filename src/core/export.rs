// PacketSleuth - core/export.rs
//
// Text, CSV and JSON rendering of matched log entries.
// Core layer: writes to any Write trait object.

use crate::core::model::LogEntry;
use crate::util::error::ExportError;
use std::io::Write;
use std::str::FromStr;

/// Output format for matched entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One raw line per entry.
    #[default]
    Text,
    /// Pretty-printed JSON array of entry objects.
    Json,
    /// CSV with a header row.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format \"{other}\" (expected text, json or csv)"
            )),
        }
    }
}

/// Render `entries` in the given format.
pub fn export<W: Write>(
    entries: &[LogEntry],
    format: OutputFormat,
    writer: W,
) -> Result<usize, ExportError> {
    match format {
        OutputFormat::Text => export_text(entries, writer),
        OutputFormat::Json => export_json(entries, writer),
        OutputFormat::Csv => export_csv(entries, writer),
    }
}

/// Write each entry's raw line, newline-terminated.
pub fn export_text<W: Write>(entries: &[LogEntry], mut writer: W) -> Result<usize, ExportError> {
    for entry in entries {
        writeln!(writer, "{}", entry.raw).map_err(ExportError::Io)?;
    }
    writer.flush().map_err(ExportError::Io)?;
    Ok(entries.len())
}

/// Export entries to CSV.
///
/// Writes: timestamp, level, user, source, line, message
pub fn export_csv<W: Write>(entries: &[LogEntry], writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["timestamp", "level", "user", "source", "line", "message"])
        .map_err(ExportError::Csv)?;

    for entry in entries {
        let ts = entry
            .timestamp
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let (source, line) = match entry.location {
            Some(ref loc) => (loc.source.as_str(), loc.line.to_string()),
            None => ("", String::new()),
        };

        csv_writer
            .write_record([
                ts.as_str(),
                entry.level.as_deref().unwrap_or(""),
                entry.user.as_deref().unwrap_or(""),
                source,
                line.as_str(),
                entry.message.as_str(),
            ])
            .map_err(ExportError::Csv)?;
    }

    csv_writer.flush().map_err(ExportError::Io)?;

    Ok(entries.len())
}

/// Export entries to JSON (array of objects).
pub fn export_json<W: Write>(entries: &[LogEntry], mut writer: W) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(&mut writer, entries).map_err(ExportError::Json)?;
    writeln!(writer).map_err(ExportError::Io)?;
    Ok(entries.len())
}
