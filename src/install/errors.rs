//! Error types for firmware update operations.
//!
//! This module defines the closed set of errors that planning and executing
//! an update can produce. Each variant carries the context needed to explain
//! the failure, and [`InstallError::fix_suggestion`] gives the remediation
//! to show the user.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used for collaborator failures of heterogeneous origin.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while planning or executing a firmware update.
///
/// # Example
///
/// ```rust
/// use vexos_dl::InstallError;
///
/// fn report(error: &InstallError) -> i32 {
///     eprintln!("Update failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
///     error.exit_code()
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// A version token or dotted version string did not have the expected shape.
    #[error("Malformed version '{token}': {reason}")]
    MalformedVersion {
        /// The rejected input.
        token: String,
        /// Which structural rule it broke.
        reason: &'static str,
    },

    /// The catalog could not be fetched.
    #[error("Catalog unavailable at {url}{}", status_suffix(*status))]
    CatalogUnavailable {
        url: String,
        /// HTTP status, when the server answered with a non-success code.
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// The catalog answered, but not with a version token.
    #[error("Catalog at {url} returned an unexpected response: '{excerpt}'")]
    CatalogMalformed {
        url: String,
        /// The first characters of the response body.
        excerpt: String,
    },

    /// Leftover files from a previous run could not be removed.
    #[error("Failed to remove leftover {}", path.display())]
    ConflictResolutionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The firmware package could not be downloaded or saved.
    #[error("Failed to download {url}{}", status_suffix(*status))]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// The firmware package could not be unpacked into place.
    #[error("Failed to extract {}", path.display())]
    ExtractFailed {
        /// The archive or directory the failing operation touched.
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The installed manifest records a version that cannot be parsed.
    #[error("Installed manifest {} records unparseable version '{value}'", path.display())]
    ManifestUnreadable { path: PathBuf, value: String },
}

fn status_suffix(status: Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl InstallError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vexos_dl::InstallError;
    ///
    /// let error = InstallError::MalformedVersion {
    ///     token: "VEXOS_V5_1_1".to_string(),
    ///     reason: "expected 6 underscore-separated fields",
    /// };
    /// assert!(error.fix_suggestion().contains("VEXOS_V5_"));
    /// ```
    pub fn fix_suggestion(&self) -> &'static str {
        match self {
            Self::MalformedVersion { .. } => {
                "Pass a version in the form VEXOS_V5_<major>_<minor>_<patch>_<build>"
            }
            Self::CatalogUnavailable { .. } => "Check your internet connection and try again",
            Self::CatalogMalformed { .. } => {
                "The catalog server returned unexpected content; check your connection or try again later"
            }
            Self::ConflictResolutionFailed { .. } => {
                "Check permissions on the download directory or remove the leftover files manually"
            }
            Self::DownloadFailed { .. } => {
                "Check your internet connection, that the version exists, and that the download directory is writable"
            }
            Self::ExtractFailed { .. } => {
                "Check permissions on the install directory and rerun with --force"
            }
            Self::ManifestUnreadable { .. } => {
                "Rerun with --force to reinstall, or remove the install directory"
            }
        }
    }

    /// Process exit code for this error kind. Codes 0 to 2 are reserved.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedVersion { .. } => 3,
            Self::CatalogUnavailable { .. } => 4,
            Self::CatalogMalformed { .. } => 5,
            Self::ConflictResolutionFailed { .. } => 6,
            Self::DownloadFailed { .. } => 7,
            Self::ExtractFailed { .. } => 8,
            Self::ManifestUnreadable { .. } => 9,
        }
    }
}
