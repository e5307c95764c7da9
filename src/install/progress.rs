//! Progress reporting for install execution.
//!
//! The executor reports each step it enters through a caller-supplied
//! callback, so a CLI can print status lines and an embedder can drive its
//! own UI.

use crate::FirmwareVersion;

/// Stages of an install, in the order they occur.
///
/// # Example
///
/// ```rust
/// use vexos_dl::InstallProgress;
///
/// fn on_progress(progress: InstallProgress) {
///     match &progress {
///         InstallProgress::Started { version } => println!("Installing VEXos {}", version),
///         InstallProgress::Completed { version } => println!("Installed VEXos {}", version),
///         other => println!("{}...", other.description()),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallProgress {
    /// Execution of a non-skip plan has started.
    Started { version: FirmwareVersion },

    /// Removing leftovers from an earlier run.
    ResolvingConflicts,

    /// Downloading the package.
    Downloading { version: FirmwareVersion },

    /// Unpacking the package into the install target.
    Extracting,

    /// Removing the downloaded package.
    CleaningUp,

    /// The new version is in place.
    Completed { version: FirmwareVersion },
}

impl InstallProgress {
    /// Get a human-readable description of the current progress stage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vexos_dl::InstallProgress;
    ///
    /// assert_eq!(InstallProgress::Extracting.description(), "Extracting VEXos");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Starting installation",
            Self::ResolvingConflicts => "Conflicts found, deleting old files",
            Self::Downloading { .. } => "Downloading VEXos",
            Self::Extracting => "Extracting VEXos",
            Self::CleaningUp => "Cleaning up",
            Self::Completed { .. } => "Installation complete",
        }
    }

    /// Check if this progress stage indicates completion.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
