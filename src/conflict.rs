//! Detection and cleanup of state left behind by interrupted runs.

use crate::{InstallError, InstallPaths};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Classification of leftover on-disk state.
///
/// A staged artifact found while planning is always a conflict: it means a
/// previous run was interrupted between download and cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConflictState {
    /// No leftover artifact.
    None,
    /// An artifact exists but no install target does.
    StaleArtifact,
    /// Both an artifact and an install target exist.
    StaleTargetAndArtifact,
}

impl ConflictState {
    pub fn is_conflict(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Classify the given existence flags.
pub fn detect(target_exists: bool, artifact_exists: bool) -> ConflictState {
    match (artifact_exists, target_exists) {
        (false, _) => ConflictState::None,
        (true, false) => ConflictState::StaleArtifact,
        (true, true) => ConflictState::StaleTargetAndArtifact,
    }
}

/// Inspect the filesystem and classify what is there.
pub fn probe(paths: &InstallPaths) -> ConflictState {
    let target_exists = paths.target_dir().exists();
    if target_exists && !paths.manifest().is_file() {
        debug!(
            "Install target {} has no manifest; treating it as not installed",
            paths.target_dir().display()
        );
    }
    detect(target_exists, paths.artifact().exists())
}

/// Remove leftovers according to `state`.
///
/// Paths that are already absent count as removed. Any other I/O failure
/// aborts with [`InstallError::ConflictResolutionFailed`].
pub fn resolve(paths: &InstallPaths, state: ConflictState) -> Result<(), InstallError> {
    if !state.is_conflict() {
        return Ok(());
    }

    info!("Resolving conflict ({}), removing leftover files", state);
    remove_file(paths.artifact())?;
    remove_file(&paths.partial_artifact())?;
    remove_dir(&paths.staging_dir())?;

    if state == ConflictState::StaleTargetAndArtifact {
        remove_dir(paths.target_dir())?;
    }
    Ok(())
}

fn remove_file(path: &Path) -> Result<(), InstallError> {
    ignore_missing(std::fs::remove_file(path), path)
}

fn remove_dir(path: &Path) -> Result<(), InstallError> {
    ignore_missing(std::fs::remove_dir_all(path), path)
}

fn ignore_missing(result: io::Result<()>, path: &Path) -> Result<(), InstallError> {
    match result {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(InstallError::ConflictResolutionFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
