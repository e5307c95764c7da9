//! Update configuration.
//!
//! This module provides [`InstallPaths`], which names every filesystem
//! location the updater touches, and [`RemoteOptions`], which configures
//! where firmware is fetched from.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default location of the VEXos content server.
pub const DEFAULT_BASE_URL: &str = "https://content.vexrobotics.com/vexos/public/V5/";

/// File name of the staged download artifact.
pub const ARTIFACT_FILE_NAME: &str = "vexos.vexos";

/// Directory name of the install target.
pub const TARGET_DIR_NAME: &str = "vexos";

/// File name of the manifest inside the install target.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Filesystem locations used by an update.
///
/// The artifact path and target directory are configured; everything else
/// is derived from them so that a single value describes the whole on-disk
/// footprint.
///
/// # Example
///
/// ```rust
/// use vexos_dl::InstallPaths;
/// use std::path::Path;
///
/// let paths = InstallPaths::in_dir("/opt/vex");
/// assert_eq!(paths.artifact(), Path::new("/opt/vex/vexos.vexos"));
/// assert_eq!(paths.target_dir(), Path::new("/opt/vex/vexos"));
/// assert_eq!(paths.manifest(), Path::new("/opt/vex/vexos/manifest.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    artifact: PathBuf,
    target_dir: PathBuf,
}

impl InstallPaths {
    /// Use explicit locations for the artifact and the install target.
    ///
    /// Both paths must end in a plain name: `.`, `..` and filesystem roots
    /// are rejected with [`io::ErrorKind::InvalidInput`], since the `.part`
    /// file and the staging directory are derived as siblings of them.
    pub fn new(artifact: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let artifact = artifact.into();
        let target_dir = target_dir.into();
        ensure_named(&artifact, "artifact")?;
        ensure_named(&target_dir, "install target")?;
        Ok(Self {
            artifact,
            target_dir,
        })
    }

    /// Standard layout rooted at `root`: `root/vexos.vexos` and `root/vexos/`.
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            artifact: root.join(ARTIFACT_FILE_NAME),
            target_dir: root.join(TARGET_DIR_NAME),
        }
    }

    /// Where the downloaded archive is staged.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Directory holding the installed firmware tree.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn manifest(&self) -> PathBuf {
        self.target_dir.join(MANIFEST_FILE_NAME)
    }

    /// In-flight download, renamed to [`artifact`](Self::artifact) once complete.
    pub fn partial_artifact(&self) -> PathBuf {
        with_suffix(&self.artifact, ".part")
    }

    /// Sibling of the target where archives are unpacked before being swapped in.
    pub fn staging_dir(&self) -> PathBuf {
        with_suffix(&self.target_dir, ".staging")
    }
}

impl Default for InstallPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

fn ensure_named(path: &Path, what: &str) -> io::Result<()> {
    match path.components().next_back() {
        Some(Component::Normal(_)) => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} path {} does not end in a file name", what, path.display()),
        )),
    }
}

pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Configuration for the remote content server.
///
/// # Example
///
/// ```rust
/// use vexos_dl::RemoteOptions;
/// use std::time::Duration;
///
/// let opts = RemoteOptions::default();
/// assert_eq!(opts.timeout, Duration::from_secs(300));
///
/// let opts = RemoteOptions {
///     base_url: "http://localhost:8080/V5/".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(opts.catalog_url(), "http://localhost:8080/V5/catalog.txt");
/// ```
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// Base URL that the catalog and firmware packages live under.
    ///
    /// Default: [`DEFAULT_BASE_URL`]
    pub base_url: String,

    /// Maximum time for a single request, including reading the body.
    ///
    /// Default: 5 minutes
    pub timeout: Duration,
}

impl RemoteOptions {
    pub fn catalog_url(&self) -> String {
        format!("{}catalog.txt", self.normalized_base())
    }

    /// URL of the firmware package for `token`.
    pub fn artifact_url(&self, token: &str) -> String {
        format!("{}{}.vexos", self.normalized_base(), token)
    }

    fn normalized_base(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}
