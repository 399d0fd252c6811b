// PacketSleuth - app/pipeline.rs
//
// Run orchestration: open packet -> select log entries -> for each entry,
// extract to scratch and scan -> aggregate.
//
// Architecture:
//   - One run owns one scratch directory (a `tempfile::TempDir`). It is removed
//     when the run returns, on every path, including early returns and panics.
//   - Everything is passed in explicitly (packet path, criteria, config); there
//     is no process-wide state, so concurrent runs are independent.
//
// Failure policy:
//   - Fatal: packet cannot be opened, scratch cannot be created. Invalid
//     criteria are rejected earlier, when `FilterCriteria` is built.
//   - Per-file failures (extraction, open for scan, mid-file read errors) are
//     logged, recorded in `RunReport::warnings`, and the run moves on.

use crate::app::scan::{self, ScanOutcome};
use crate::core::filter::FilterCriteria;
use crate::core::model::{FileSummary, RunReport, RunWarning};
use crate::platform::archive::{self, PacketArchive, ZipPacket};
use crate::util::constants;
use crate::util::error::{PacketError, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;

/// Per-run settings. Passed explicitly to every run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for the run's scratch directory.
    /// `None` means the system temp directory.
    pub scratch_root: Option<PathBuf>,

    /// Cap on matched entries held in memory.
    pub max_results: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_root: None,
            max_results: constants::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Extract and filter the log records of the support packet at `archive_path`.
pub fn run(
    archive_path: &Path,
    criteria: &FilterCriteria,
    config: &PipelineConfig,
) -> Result<RunReport> {
    let mut packet = ZipPacket::open(archive_path).map_err(|e| PacketError::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(packet = %archive_path.display(), "Processing support packet");

    run_archive(&mut packet, criteria, config)
}

/// Same pipeline over an already-opened archive.
pub fn run_archive<A: PacketArchive + ?Sized>(
    archive: &mut A,
    criteria: &FilterCriteria,
    config: &PipelineConfig,
) -> Result<RunReport> {
    let started = Instant::now();
    let scratch = create_scratch(config)?;

    let selected = archive::select_log_entries(archive);
    let mut report = RunReport {
        selected_entries: selected.len(),
        ..Default::default()
    };

    tracing::info!(
        selected = selected.len(),
        criteria = %criteria.describe(),
        scratch = %scratch.path().display(),
        "Scanning log entries"
    );

    for entry in &selected {
        let extracted = match archive::materialize(archive, entry, scratch.path()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(entry = %entry.name, error = %e, "Extraction failed, entry skipped");
                report.push_warning(RunWarning::Extraction(e));
                continue;
            }
        };

        let remaining = config.max_results.saturating_sub(report.entries.len());
        let outcome = match scan::scan_file_as(&extracted, &entry.name, criteria, remaining) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(entry = %entry.name, error = %e, "Scan failed, file skipped");
                report.push_warning(RunWarning::Scan(e));
                continue;
            }
        };

        let ScanOutcome {
            entries,
            lines_read,
            earliest,
            latest,
            interrupted,
            limit_reached,
        } = outcome;

        tracing::debug!(
            entry = %entry.name,
            lines = lines_read,
            matched = entries.len(),
            "File scanned"
        );

        report.files.push(FileSummary {
            entry_name: entry.name.clone(),
            lines_read,
            matched: entries.len(),
            earliest,
            latest,
        });
        report.entries.extend(entries);

        if let Some(e) = interrupted {
            tracing::warn!(
                entry = %entry.name,
                lines = lines_read,
                error = %e,
                "Read stopped part-way, partial results kept"
            );
            report.push_warning(RunWarning::PartialRead {
                entry: entry.name.clone(),
                lines_read,
                source: e,
            });
        }

        if limit_reached {
            tracing::warn!(
                max_results = config.max_results,
                "Result limit reached, remaining entries not scanned"
            );
            report.truncated = true;
            report.push_warning(RunWarning::ResultLimitReached {
                max_results: config.max_results,
            });
            break;
        }
    }

    // Dropping the TempDir would also remove it; closing explicitly surfaces
    // removal failures in the log.
    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!(
            scratch = %scratch_path.display(),
            error = %e,
            "Failed to remove scratch directory"
        );
    }

    report.duration = started.elapsed();

    if report.is_empty() {
        tracing::info!("No log files found in the support packet or no entries matched the criteria");
    } else {
        tracing::info!(
            files = report.files.len(),
            entries = report.entries.len(),
            warnings = report.warnings.len() + report.warnings_dropped,
            "Run complete"
        );
    }

    Ok(report)
}

fn create_scratch(config: &PipelineConfig) -> Result<TempDir> {
    let root = config
        .scratch_root
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    tempfile::Builder::new()
        .prefix(constants::SCRATCH_DIR_PREFIX)
        .tempdir_in(&root)
        .map_err(|e| PacketError::ScratchSetup { root, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ArchiveEntry;
    use crate::util::error::ExtractionError;
    use std::io::{self, Read};

    /// In-memory archive; `None` content means the entry cannot be opened.
    struct MemoryPacket {
        entries: Vec<(String, Option<Vec<u8>>)>,
    }

    impl MemoryPacket {
        fn new(entries: &[(&str, Option<&str>)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(n, c)| (n.to_string(), c.map(|c| c.as_bytes().to_vec())))
                    .collect(),
            }
        }
    }

    impl PacketArchive for MemoryPacket {
        fn entries(&self) -> Vec<ArchiveEntry> {
            self.entries
                .iter()
                .enumerate()
                .map(|(index, (name, _))| ArchiveEntry {
                    index,
                    name: name.clone(),
                })
                .collect()
        }

        fn open_entry(&mut self, entry: &ArchiveEntry) -> io::Result<Box<dyn Read + '_>> {
            match &self.entries[entry.index].1 {
                Some(bytes) => Ok(Box::new(bytes.as_slice())),
                None => Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt entry")),
            }
        }
    }

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            scratch_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    fn is_empty_dir(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn test_results_in_entry_order() {
        let mut packet = MemoryPacket::new(&[
            ("b/logs/second.log", Some("INFO from second\n")),
            ("readme.txt", Some("INFO not a log\n")),
            ("a/logs/first.log", Some("INFO from first\nINFO again\n")),
        ]);
        let root = tempfile::tempdir().unwrap();
        let report =
            run_archive(&mut packet, &FilterCriteria::default(), &config_in(root.path())).unwrap();

        let messages: Vec<_> = report.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["from second", "from first", "again"]);
        assert_eq!(report.selected_entries, 2);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[1].matched, 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unopenable_entry_is_skipped() {
        let mut packet = MemoryPacket::new(&[
            ("x/logs/broken.log", None),
            ("y/logs/good.log", Some("ERROR user=bob trouble\n")),
        ]);
        let root = tempfile::tempdir().unwrap();
        let report =
            run_archive(&mut packet, &FilterCriteria::default(), &config_in(root.path())).unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].user.as_deref(), Some("bob"));
        assert_eq!(report.warnings.len(), 1);
        match &report.warnings[0] {
            RunWarning::Extraction(e @ ExtractionError::Open { .. }) => {
                assert_eq!(e.entry(), "x/logs/broken.log");
            }
            other => panic!("unexpected warning: {other:?}"),
        }
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn test_same_base_name_both_scanned() {
        let mut packet = MemoryPacket::new(&[
            ("node1/logs/mattermost.log", Some("INFO one\n")),
            ("node2/logs/mattermost.log", Some("INFO two\n")),
        ]);
        let root = tempfile::tempdir().unwrap();
        let report =
            run_archive(&mut packet, &FilterCriteria::default(), &config_in(root.path())).unwrap();

        let sources: Vec<_> = report
            .entries
            .iter()
            .map(|e| e.location.as_ref().unwrap().source.as_str())
            .collect();
        assert_eq!(
            sources,
            vec!["node1/logs/mattermost.log", "node2/logs/mattermost.log"]
        );
    }

    #[test]
    fn test_scratch_removed_after_run() {
        let mut packet = MemoryPacket::new(&[("mattermost.log", Some("INFO hi\n"))]);
        let root = tempfile::tempdir().unwrap();
        run_archive(&mut packet, &FilterCriteria::default(), &config_in(root.path())).unwrap();
        assert!(is_empty_dir(root.path()));
    }

    #[test]
    fn test_scratch_setup_failure_is_fatal() {
        let mut packet = MemoryPacket::new(&[("mattermost.log", Some("INFO hi\n"))]);
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("no").join("such").join("dir");
        let result = run_archive(&mut packet, &FilterCriteria::default(), &config_in(&missing));
        assert!(matches!(result, Err(PacketError::ScratchSetup { .. })));
    }

    #[test]
    fn test_result_limit_truncates() {
        let mut packet = MemoryPacket::new(&[
            ("a/logs/one.log", Some("INFO 1\nINFO 2\n")),
            ("a/logs/two.log", Some("INFO 3\nINFO 4\n")),
            ("a/logs/three.log", Some("INFO 5\n")),
        ]);
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            max_results: 3,
            ..config_in(root.path())
        };
        let report = run_archive(&mut packet, &FilterCriteria::default(), &config).unwrap();

        assert_eq!(report.entries.len(), 3);
        assert!(report.truncated);
        assert_eq!(report.files.len(), 2);
        assert!(matches!(
            report.warnings.last(),
            Some(RunWarning::ResultLimitReached { max_results: 3 })
        ));
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let mut packet = MemoryPacket::new(&[("mattermost.log", Some("INFO hi\n"))]);
        let root = tempfile::tempdir().unwrap();
        let criteria = FilterCriteria {
            level: Some("ERROR".to_string()),
            ..Default::default()
        };
        let report = run_archive(&mut packet, &criteria, &config_in(root.path())).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.files.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_run_on_missing_packet_fails_to_open() {
        let root = tempfile::tempdir().unwrap();
        let result = run(
            &root.path().join("missing.zip"),
            &FilterCriteria::default(),
            &config_in(root.path()),
        );
        assert!(matches!(result, Err(PacketError::ArchiveOpen { .. })));
        assert!(is_empty_dir(root.path()));
    }
}
