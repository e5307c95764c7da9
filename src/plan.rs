//! Deciding whether, and how, to install.
//!
//! Planning never mutates the filesystem. It resolves the target version,
//! compares it with what is installed and checks for leftovers, producing a
//! [`PlannedInstall`] that the executor consumes exactly once.

use crate::conflict::ConflictState;
use crate::manifest::InstalledManifest;
use crate::remote::CatalogFetcher;
use crate::{is_outdated, FirmwareVersion, InstallError, VersionToken};
use std::fmt;
use tracing::{debug, info, warn};

/// What the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Explicit version token, or `None` for the catalog's latest.
    pub version: Option<String>,

    /// Reinstall even when up to date, and clear leftovers from prior runs.
    pub force: bool,
}

impl InstallRequest {
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn version(token: impl Into<String>) -> Self {
        Self {
            version: Some(token.into()),
            force: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Why a plan decided not to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The installed version is not older than the target.
    UpToDate,
    /// Leftovers from a prior run exist and `force` was not given.
    Conflict(ConflictState),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => f.write_str("up to date"),
            Self::Conflict(_) => f.write_str("conflict: rerun with force or clean manually"),
        }
    }
}

/// The decision produced by [`plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Skip(SkipReason),
    /// Install with no leftovers to clear.
    ProceedClean,
    /// Clear leftovers, then install.
    ProceedOverConflict,
}

impl Plan {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// A plan together with the versions it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstall {
    pub plan: Plan,
    /// The version that would be installed.
    pub target: VersionToken,
    /// The installed version, if one could be determined.
    pub installed: Option<FirmwareVersion>,
}

/// Decide what to do.
///
/// The target token is validated here, before anything touches the network
/// or the filesystem, so a malformed explicit version is reported first.
/// The catalog is only consulted when no explicit version is requested.
pub async fn plan<C>(
    request: &InstallRequest,
    installed: Option<&InstalledManifest>,
    conflict: ConflictState,
    catalog: &C,
) -> Result<PlannedInstall, InstallError>
where
    C: CatalogFetcher,
{
    let target = match &request.version {
        Some(token) => {
            let token = VersionToken::parse(token)?;
            info!("Version specified: {}", token);
            token
        }
        None => {
            let token = VersionToken::parse(&catalog.latest().await?)?;
            info!("Latest version: {}", token.version());
            token
        }
    };

    let installed_version = match installed {
        Some(manifest) => match manifest.parsed_version() {
            Ok(version) => Some(version),
            Err(e) if request.force => {
                warn!("{}; continuing because force is set", e);
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    if let Some(current) = &installed_version {
        if !is_outdated(current, &target.version()) {
            if !request.force {
                debug!("Installed {} is not older than {}", current, target.version());
                return Ok(PlannedInstall {
                    plan: Plan::Skip(SkipReason::UpToDate),
                    target,
                    installed: installed_version,
                });
            }
            info!("Installed {} is up to date, continuing anyway", current);
        }
    }

    let plan = match (conflict.is_conflict(), request.force) {
        (false, _) => Plan::ProceedClean,
        (true, false) => Plan::Skip(SkipReason::Conflict(conflict)),
        (true, true) => Plan::ProceedOverConflict,
    };

    Ok(PlannedInstall {
        plan,
        target,
        installed: installed_version,
    })
}
