// PacketSleuth - platform/archive.rs
//
// Support packet access and safe extraction of log-bearing entries.
//
// Architecture note: container decoding is delegated to the `zip` crate and
// hidden behind the `PacketArchive` trait (list entries, open an entry as a
// byte stream), so the pipeline can run over any container implementation.
//
// Extraction never writes outside the destination directory: each entry is
// flattened to its base name, and names that are not a single normal path
// component are rejected.

use crate::core::model::ArchiveEntry;
use crate::util::error::{ArchiveError, ExtractionError};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Capability to enumerate a container's entries and stream their content.
pub trait PacketArchive {
    /// All entries, in archive enumeration order.
    fn entries(&self) -> Vec<ArchiveEntry>;

    /// Open an entry's content as a byte stream.
    fn open_entry(&mut self, entry: &ArchiveEntry) -> io::Result<Box<dyn Read + '_>>;
}

// =============================================================================
// ZIP implementation
// =============================================================================

/// A support packet opened as a ZIP container.
pub struct ZipPacket {
    archive: zip::ZipArchive<File>,
}

impl ZipPacket {
    /// Open `path` as a ZIP container. Reads the central directory only.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(ArchiveError::Io)?;
        let archive = zip::ZipArchive::new(file).map_err(ArchiveError::Zip)?;
        tracing::debug!(
            packet = %path.display(),
            entries = archive.len(),
            "Support packet opened"
        );
        Ok(Self { archive })
    }
}

impl PacketArchive for ZipPacket {
    fn entries(&self) -> Vec<ArchiveEntry> {
        (0..self.archive.len())
            .filter_map(|index| {
                self.archive.name_for_index(index).map(|name| ArchiveEntry {
                    index,
                    name: name.to_string(),
                })
            })
            .collect()
    }

    fn open_entry(&mut self, entry: &ArchiveEntry) -> io::Result<Box<dyn Read + '_>> {
        let file = self.archive.by_index(entry.index).map_err(io::Error::from)?;
        Ok(Box::new(file))
    }
}

// =============================================================================
// Selection and materialisation
// =============================================================================

/// Every log-bearing entry, in archive enumeration order.
pub fn select_log_entries<A: PacketArchive + ?Sized>(archive: &A) -> Vec<ArchiveEntry> {
    archive
        .entries()
        .into_iter()
        .filter(ArchiveEntry::is_log_bearing)
        .collect()
}

/// Copy one entry into `destination_dir/<base name>`.
///
/// The entry stream is opened exactly once. An existing file with the same
/// base name is overwritten.
pub fn materialize<A: PacketArchive + ?Sized>(
    archive: &mut A,
    entry: &ArchiveEntry,
    destination_dir: &Path,
) -> Result<PathBuf, ExtractionError> {
    let file_name = entry.base_name();
    if !is_single_normal_component(file_name) {
        return Err(ExtractionError::UnsafeName {
            entry: entry.name.clone(),
        });
    }
    let dest_path = destination_dir.join(file_name);

    let mut reader = archive
        .open_entry(entry)
        .map_err(|e| ExtractionError::Open {
            entry: entry.name.clone(),
            source: e,
        })?;

    let mut out = File::create(&dest_path).map_err(|e| ExtractionError::Create {
        entry: entry.name.clone(),
        path: dest_path.clone(),
        source: e,
    })?;

    let bytes = io::copy(&mut reader, &mut out).map_err(|e| ExtractionError::Copy {
        entry: entry.name.clone(),
        path: dest_path.clone(),
        source: e,
    })?;

    tracing::debug!(
        entry = %entry.name,
        dest = %dest_path.display(),
        bytes,
        "Entry extracted"
    );

    Ok(dest_path)
}

/// True when `name` is exactly one ordinary path component (not empty, `.`,
/// `..`, a root, or a drive prefix).
fn is_single_normal_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
