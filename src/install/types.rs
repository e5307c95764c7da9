//! Result types for install execution.

use crate::plan::SkipReason;
use crate::FirmwareVersion;

/// Named steps of an install, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InstallStep {
    ResolveConflicts,
    Fetch,
    Extract,
    Cleanup,
}

/// Outcome of executing a plan.
///
/// # Example
///
/// ```rust
/// use vexos_dl::{FirmwareVersion, InstallSummary};
///
/// let summary = InstallSummary::Installed {
///     previous: None,
///     installed: FirmwareVersion::new(1, 1, 4, 0),
/// };
/// assert!(summary.changed());
/// assert_eq!(summary.old_version_label(), "None");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSummary {
    /// The plan was a skip; nothing on disk changed.
    Unchanged {
        reason: SkipReason,
        installed: Option<FirmwareVersion>,
        target: FirmwareVersion,
    },

    /// A new version was installed.
    Installed {
        /// What was installed before, if it could be determined.
        previous: Option<FirmwareVersion>,
        installed: FirmwareVersion,
    },
}

impl InstallSummary {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }

    /// The version installed once this run finished, if any.
    pub fn current_version(&self) -> Option<FirmwareVersion> {
        match self {
            Self::Unchanged { installed, .. } => *installed,
            Self::Installed { installed, .. } => Some(*installed),
        }
    }

    /// The pre-run version rendered for display, `None` when absent.
    pub fn old_version_label(&self) -> String {
        let previous = match self {
            Self::Unchanged { installed, .. } => installed,
            Self::Installed { previous, .. } => previous,
        };
        previous
            .map(|v| v.to_string())
            .unwrap_or_else(|| "None".to_string())
    }
}
