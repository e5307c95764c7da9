//! Reading the manifest of an installed firmware tree.
//!
//! The manifest ships inside the firmware archive, so it only exists once a
//! package has been fully unpacked into the install target. This crate never
//! writes it.

use crate::{FirmwareVersion, InstallError, MANIFEST_FILE_NAME};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The parts of `manifest.json` the updater cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstalledManifest {
    /// Dotted version string, e.g. `1.1.4.0`.
    pub version: String,

    #[serde(skip)]
    path: PathBuf,
}

impl InstalledManifest {
    pub fn new(version: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
        }
    }

    /// Location the manifest was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the recorded version.
    ///
    /// Fails with [`InstallError::ManifestUnreadable`] if the manifest
    /// records something other than a dotted four-component version.
    pub fn parsed_version(&self) -> Result<FirmwareVersion, InstallError> {
        self.version
            .trim()
            .parse()
            .map_err(|_| InstallError::ManifestUnreadable {
                path: self.path.clone(),
                value: self.version.clone(),
            })
    }
}

/// Source of the installed manifest.
pub trait ManifestStore {
    /// Read the manifest under `target_dir`.
    ///
    /// A missing, unreadable or invalid manifest yields `None`: the target
    /// is then treated as having no installed version.
    fn read(&self, target_dir: &Path) -> Option<InstalledManifest>;
}

/// Reads `manifest.json` with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestStore;

impl ManifestStore for JsonManifestStore {
    fn read(&self, target_dir: &Path) -> Option<InstalledManifest> {
        let path = target_dir.join(MANIFEST_FILE_NAME);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No manifest at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<InstalledManifest>(&contents) {
            Ok(mut manifest) => {
                manifest.path = path;
                Some(manifest)
            }
            Err(e) => {
                warn!("Ignoring invalid manifest {}: {}", path.display(), e);
                None
            }
        }
    }
}
