//! Ordering of firmware versions.

use super::FirmwareVersion;
use std::cmp::Ordering;

/// Position of one version relative to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum VersionOrdering {
    Older,
    Same,
    Newer,
}

impl From<Ordering> for VersionOrdering {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Older,
            Ordering::Equal => Self::Same,
            Ordering::Greater => Self::Newer,
        }
    }
}

/// Compare `a` relative to `b`.
///
/// Components are compared as integers in the order major, minor, patch,
/// build; the first difference decides. `1.9.0.0` is therefore older than
/// `1.10.0.0`.
///
/// # Example
///
/// ```rust
/// use vexos_dl::{compare, FirmwareVersion, VersionOrdering};
///
/// let a = FirmwareVersion::new(1, 9, 0, 0);
/// let b = FirmwareVersion::new(1, 10, 0, 0);
/// assert_eq!(compare(&a, &b), VersionOrdering::Older);
/// ```
pub fn compare(a: &FirmwareVersion, b: &FirmwareVersion) -> VersionOrdering {
    let a = (a.major, a.minor, a.patch, a.build);
    let b = (b.major, b.minor, b.patch, b.build);
    a.cmp(&b).into()
}

/// Whether `installed` is strictly older than `candidate`.
pub fn is_outdated(installed: &FirmwareVersion, candidate: &FirmwareVersion) -> bool {
    compare(installed, candidate) == VersionOrdering::Older
}
