//! Remote collaborators: the version catalog and the package server.
//!
//! The traits here are the seams the planner and executor depend on.
//! [`HttpRemote`] implements both against the VEXos content server; tests
//! substitute in-memory implementations.

mod http;

pub use http::HttpRemote;

use crate::{InstallError, VersionToken};
use std::future::Future;
use std::path::Path;

/// Source of the latest published version token.
pub trait CatalogFetcher {
    /// Fetch the latest token.
    ///
    /// Fails with [`InstallError::CatalogUnavailable`] on transport errors and
    /// [`InstallError::CatalogMalformed`] if the response does not start with
    /// [`TOKEN_PREFIX`](crate::TOKEN_PREFIX).
    fn latest(&self) -> impl Future<Output = Result<String, InstallError>> + Send;
}

/// Downloads firmware packages.
pub trait ArtifactFetcher {
    /// Download the package for `token` to `dest`.
    ///
    /// Missing parent directories of `dest` are created. Implementations
    /// must write atomically: on success `dest` holds the complete package,
    /// on failure `dest` does not exist.
    fn fetch(
        &self,
        token: &VersionToken,
        dest: &Path,
    ) -> impl Future<Output = Result<(), InstallError>> + Send;
}
