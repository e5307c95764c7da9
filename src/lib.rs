//! # vexos-dl
//!
//! Downloader and updater for VEX V5 brain firmware (VEXos).
//!
//! This crate fetches a firmware package from the VEXos content server,
//! checks it against the locally installed version, and installs it into a
//! local directory. The work is split into a pure planning phase and an
//! execution phase, so a caller can inspect what would happen before
//! anything on disk changes.
//!
//! ## Features
//!
//! - [`FirmwareVersion`] and [`VersionToken`] for the vendor's
//!   `VEXOS_V5_<major>_<minor>_<patch>_<build>` version format
//! - [`plan()`] to decide between skipping, installing, and installing over
//!   leftovers from an interrupted run
//! - [`execute`] to carry out a plan, with [`InstallProgress`] callbacks
//! - [`Updater`] to bundle both with a set of [`InstallPaths`]
//! - Mockable collaborator traits ([`CatalogFetcher`], [`ArtifactFetcher`],
//!   [`ArchiveExtractor`], [`ManifestStore`]) with HTTP, zip and JSON
//!   implementations
//!
//! ## Example
//!
//! ```rust,no_run
//! use vexos_dl::{HttpRemote, InstallPaths, InstallRequest, RemoteOptions, Updater};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let remote = HttpRemote::new(RemoteOptions::default()).expect("HTTP client");
//!     let updater = Updater::new(InstallPaths::in_dir("."), remote.clone(), remote);
//!
//!     // Decide first
//!     let planned = match updater.plan(&InstallRequest::latest()).await {
//!         Ok(planned) => planned,
//!         Err(e) => {
//!             eprintln!("{}. Fix: {}", e, e.fix_suggestion());
//!             return;
//!         }
//!     };
//!     println!("Plan: {:?} for {}", planned.plan, planned.target);
//!
//!     // Then act
//!     let summary = updater
//!         .execute(&planned, |p| println!("{}", p.description()))
//!         .await;
//!     println!("{:?}", summary);
//! }
//! ```

mod archive;
pub mod conflict;
mod install;
mod manifest;
mod options;
mod plan;
mod remote;
mod updater;
pub mod version;

pub use archive::{ArchiveExtractor, ZipExtractor};
pub use conflict::ConflictState;
pub use install::{execute, BoxError, InstallError, InstallProgress, InstallStep, InstallSummary};
pub use manifest::{InstalledManifest, JsonManifestStore, ManifestStore};
pub use options::{
    InstallPaths, RemoteOptions, ARTIFACT_FILE_NAME, DEFAULT_BASE_URL, MANIFEST_FILE_NAME,
    TARGET_DIR_NAME,
};
pub use plan::{plan, InstallRequest, Plan, PlannedInstall, SkipReason};
pub use remote::{ArtifactFetcher, CatalogFetcher, HttpRemote};
pub use updater::Updater;
pub use version::{
    compare, is_outdated, FirmwareVersion, VersionOrdering, VersionToken, TOKEN_PREFIX,
};
