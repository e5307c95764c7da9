//! Unpacking firmware packages.
//!
//! A `.vexos` package is a zip archive whose only top-level entry is a
//! directory named after the release. [`flatten_single_root`] lifts that
//! directory's contents up one level after extraction.

use crate::InstallError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Unpacks an archive into a directory.
pub trait ArchiveExtractor {
    /// Unpack `archive` into `dest`, creating `dest` if needed.
    ///
    /// Fails with [`InstallError::ExtractFailed`] on a corrupt archive or a
    /// filesystem error.
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), InstallError>;
}

/// Extracts zip archives with the `zip` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), InstallError> {
        let failed = |source: crate::BoxError| InstallError::ExtractFailed {
            path: archive.to_path_buf(),
            source,
        };

        let file = fs::File::open(archive).map_err(|e| failed(e.into()))?;
        let mut zip =
            zip::ZipArchive::new(io::BufReader::new(file)).map_err(|e| failed(e.into()))?;
        debug!(
            "Extracting {} entries from {} into {}",
            zip.len(),
            archive.display(),
            dest.display()
        );

        fs::create_dir_all(dest).map_err(|e| failed(e.into()))?;
        zip.extract(dest).map_err(|e| failed(e.into()))
    }
}

/// If `dir` contains exactly one entry and it is a directory, move that
/// directory's children into `dir` and remove it.
///
/// Returns the name of the directory that was lifted, if any.
pub(crate) fn flatten_single_root(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() != 1 || !entries[0].file_type()?.is_dir() {
        warn!(
            "{} does not have a single top-level directory; leaving layout as extracted",
            dir.display()
        );
        return Ok(None);
    }

    let root_name = PathBuf::from(entries.remove(0).file_name());

    // Park the root under a reserved name first: it may contain a child with
    // its own name.
    let parked = dir.join(".vexos-dl-root");
    fs::rename(dir.join(&root_name), &parked)?;
    for entry in fs::read_dir(&parked)? {
        let entry = entry?;
        fs::rename(entry.path(), dir.join(entry.file_name()))?;
    }
    fs::remove_dir(&parked)?;

    debug!("Flattened {} into {}", root_name.display(), dir.display());
    Ok(Some(root_name))
}
