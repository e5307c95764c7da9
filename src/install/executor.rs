//! Install execution.
//!
//! This module provides [`execute`], which carries out a [`PlannedInstall`]
//! as an ordered series of steps. Steps run one at a time and the first
//! failure aborts the run; whatever is left on disk is something
//! [`conflict::resolve`](crate::conflict::resolve) can clear next time.

use crate::archive::{flatten_single_root, ArchiveExtractor};
use crate::install::{InstallProgress, InstallStep, InstallSummary};
use crate::plan::{Plan, PlannedInstall};
use crate::remote::ArtifactFetcher;
use crate::{conflict, InstallError, InstallPaths};
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Execute a plan.
///
/// This function:
/// 1. Returns immediately for a skip plan
/// 2. Clears leftovers (only for [`Plan::ProceedOverConflict`])
/// 3. Downloads the package to the artifact path
/// 4. Unpacks it into a staging directory, flattens the archive's single
///    top-level directory, and swaps the result in for the install target
/// 5. Deletes the artifact (best-effort)
///
/// # Failure behaviour
///
/// - Conflict resolution failure: nothing further runs.
/// - Download failure: no artifact is left behind.
/// - Extract failure: the staging directory is discarded and the previous
///   install target is left untouched, so no manifest for the failed version
///   ever appears.
/// - Cleanup failure: logged; the install still succeeds.
///
/// Conflict resolution and extraction do blocking filesystem work and run on
/// tokio's blocking pool, which is why the extractor is cloned into the task.
///
/// # Example
///
/// ```rust,no_run
/// use vexos_dl::{
///     execute, HttpRemote, InstallPaths, Plan, PlannedInstall, RemoteOptions, VersionToken,
///     ZipExtractor,
/// };
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let planned = PlannedInstall {
///         plan: Plan::ProceedClean,
///         target: VersionToken::parse("VEXOS_V5_1_1_4_0").unwrap(),
///         installed: None,
///     };
///     let paths = InstallPaths::default();
///     let remote = HttpRemote::new(RemoteOptions::default()).unwrap();
///     let result = execute(&planned, &paths, &remote, &ZipExtractor, |p| {
///         println!("{}", p.description())
///     })
///     .await;
///
///     match result {
///         Ok(summary) => println!("{:?}", summary),
///         Err(e) => println!("Failed: {}. Fix: {}", e, e.fix_suggestion()),
///     }
/// }
/// ```
pub async fn execute<A, X, F>(
    planned: &PlannedInstall,
    paths: &InstallPaths,
    artifacts: &A,
    extractor: &X,
    on_progress: F,
) -> Result<InstallSummary, InstallError>
where
    A: ArtifactFetcher,
    X: ArchiveExtractor + Clone + Send + 'static,
    F: Fn(InstallProgress),
{
    let version = planned.target.version();

    // Step 1: Skip
    if let Plan::Skip(reason) = planned.plan {
        info!("Nothing to do: {}", reason);
        return Ok(InstallSummary::Unchanged {
            reason,
            installed: planned.installed,
            target: version,
        });
    }

    on_progress(InstallProgress::Started { version });

    // Step 2: Conflict resolution
    if planned.plan == Plan::ProceedOverConflict {
        on_progress(InstallProgress::ResolvingConflicts);
        let owned = paths.clone();
        tokio::task::spawn_blocking(move || conflict::resolve(&owned, conflict::probe(&owned)))
            .await
            .unwrap_or_else(|e| {
                Err(InstallError::ConflictResolutionFailed {
                    path: paths.artifact().to_path_buf(),
                    source: io::Error::other(e),
                })
            })
            .map_err(|e| aborted(InstallStep::ResolveConflicts, e))?;
    }

    // Step 3: Fetch
    on_progress(InstallProgress::Downloading { version });
    info!(step = %InstallStep::Fetch, "Fetching {}", planned.target);
    artifacts
        .fetch(&planned.target, paths.artifact())
        .await
        .map_err(|e| aborted(InstallStep::Fetch, e))?;

    // Step 4: Extract
    on_progress(InstallProgress::Extracting);
    info!(step = %InstallStep::Extract, "Installing into {}", paths.target_dir().display());
    let owned = paths.clone();
    let extractor = extractor.clone();
    tokio::task::spawn_blocking(move || extract(&owned, &extractor))
        .await
        .unwrap_or_else(|e| {
            Err(InstallError::ExtractFailed {
                path: paths.target_dir().to_path_buf(),
                source: e.into(),
            })
        })
        .map_err(|e| aborted(InstallStep::Extract, e))?;

    // Step 5: Cleanup
    on_progress(InstallProgress::CleaningUp);
    if let Err(e) = tokio::fs::remove_file(paths.artifact()).await {
        warn!(
            step = %InstallStep::Cleanup,
            "Failed to delete {}: {}",
            paths.artifact().display(),
            e
        );
    }

    // Step 6: Summarize
    on_progress(InstallProgress::Completed { version });
    Ok(InstallSummary::Installed {
        previous: planned.installed,
        installed: version,
    })
}

fn aborted(step: InstallStep, error: InstallError) -> InstallError {
    warn!(%step, "Aborting install: {}", error);
    error
}

fn extract<X: ArchiveExtractor>(paths: &InstallPaths, extractor: &X) -> Result<(), InstallError> {
    let staging = paths.staging_dir();
    remove_dir_if_exists(&staging).map_err(|e| extract_failed(&staging, e))?;

    let staged = extractor.unpack(paths.artifact(), &staging).and_then(|()| {
        flatten_single_root(&staging)
            .map(|_| ())
            .map_err(|e| extract_failed(&staging, e))
    });
    if let Err(e) = staged {
        discard_staging(&staging);
        return Err(e);
    }

    let target = paths.target_dir();
    let swapped = remove_dir_if_exists(target)
        .and_then(|()| std::fs::rename(&staging, target))
        .map_err(|e| extract_failed(target, e));
    if let Err(e) = swapped {
        discard_staging(&staging);
        return Err(e);
    }

    if !paths.manifest().is_file() {
        warn!(
            "Package did not contain {}; the install will not be recognised on the next run",
            paths.manifest().display()
        );
    }
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn discard_staging(staging: &Path) {
    if let Err(e) = remove_dir_if_exists(staging) {
        warn!("Failed to remove {}: {}", staging.display(), e);
    }
}

fn extract_failed(path: &Path, source: io::Error) -> InstallError {
    InstallError::ExtractFailed {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictState;
    use crate::manifest::{JsonManifestStore, ManifestStore};
    use crate::plan::SkipReason;
    use crate::{FirmwareVersion, VersionToken, ZipExtractor};
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// Serves a zip package built in memory for whatever version is requested.
    struct MemoryFetcher {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MemoryFetcher {
        fn new() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ArtifactFetcher for MemoryFetcher {
        async fn fetch(&self, token: &VersionToken, dest: &Path) -> Result<(), InstallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(InstallError::DownloadFailed {
                    url: format!("mem://{}.vexos", token),
                    status: Some(404),
                    source: None,
                });
            }
            fs::write(dest, package(token)).unwrap();
            Ok(())
        }
    }

    /// Always fails after writing a manifest, like an archive truncated mid-way.
    #[derive(Clone)]
    struct HalfExtractor;

    impl ArchiveExtractor for HalfExtractor {
        fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), InstallError> {
            let root = dest.join("VEXOS_V5_9_9_9_9");
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join("manifest.json"), r#"{"version":"9.9.9.9"}"#).unwrap();
            Err(InstallError::ExtractFailed {
                path: archive.to_path_buf(),
                source: "unexpected end of archive".into(),
            })
        }
    }

    fn package(token: &VersionToken) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let root = token.as_str();
        let manifest = format!(r#"{{"version":"{}"}}"#, token.version());
        zip.start_file(format!("{root}/manifest.json"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        zip.start_file(format!("{root}/firmware/boot.bin"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"boot").unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn planned(plan: Plan, token: &str, installed: Option<FirmwareVersion>) -> PlannedInstall {
        PlannedInstall {
            plan,
            target: VersionToken::parse(token).unwrap(),
            installed,
        }
    }

    fn install_existing(paths: &InstallPaths, version: &str) {
        fs::create_dir_all(paths.target_dir()).unwrap();
        fs::write(
            paths.manifest(),
            format!(r#"{{"version":"{}"}}"#, version),
        )
        .unwrap();
        fs::write(paths.target_dir().join("old.bin"), "old").unwrap();
    }

    #[tokio::test]
    async fn test_skip_is_noop() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        let fetcher = MemoryFetcher::new();
        let calls = AtomicUsize::new(0);

        let summary = execute(
            &planned(Plan::Skip(SkipReason::UpToDate), "VEXOS_V5_1_0_0_0", None),
            &paths,
            &fetcher,
            &ZipExtractor,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        assert!(!summary.changed());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!paths.target_dir().exists());
    }

    #[tokio::test]
    async fn test_clean_install() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());

        let summary = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &MemoryFetcher::new(),
            &ZipExtractor,
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            InstallSummary::Installed {
                previous: None,
                installed: FirmwareVersion::new(1, 1, 4, 0),
            }
        );
        let manifest = JsonManifestStore.read(paths.target_dir()).unwrap();
        assert_eq!(manifest.version, "1.1.4.0");
        assert!(paths.target_dir().join("firmware/boot.bin").is_file());
        assert!(!paths.artifact().exists());
        assert!(!paths.staging_dir().exists());
    }

    #[tokio::test]
    async fn test_install_replaces_previous_tree() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        install_existing(&paths, "1.0.0.0");

        let summary = execute(
            &planned(
                Plan::ProceedClean,
                "VEXOS_V5_1_1_4_0",
                Some(FirmwareVersion::new(1, 0, 0, 0)),
            ),
            &paths,
            &MemoryFetcher::new(),
            &ZipExtractor,
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(summary.old_version_label(), "1.0.0.0");
        assert!(!paths.target_dir().join("old.bin").exists());
        assert_eq!(
            JsonManifestStore.read(paths.target_dir()).unwrap().version,
            "1.1.4.0"
        );
    }

    #[tokio::test]
    async fn test_progress_stages_order() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        fs::write(paths.artifact(), b"stale").unwrap();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        execute(
            &planned(Plan::ProceedOverConflict, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &MemoryFetcher::new(),
            &ZipExtractor,
            move |progress| {
                let stage_name = match &progress {
                    InstallProgress::Started { .. } => "Started",
                    InstallProgress::ResolvingConflicts => "ResolvingConflicts",
                    InstallProgress::Downloading { .. } => "Downloading",
                    InstallProgress::Extracting => "Extracting",
                    InstallProgress::CleaningUp => "CleaningUp",
                    InstallProgress::Completed { .. } => "Completed",
                };
                stages_clone.lock().unwrap().push(stage_name);
            },
        )
        .await
        .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(
            *stages,
            [
                "Started",
                "ResolvingConflicts",
                "Downloading",
                "Extracting",
                "CleaningUp",
                "Completed"
            ]
        );
    }

    #[tokio::test]
    async fn test_clean_plan_does_not_resolve_conflicts() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        let saw_resolve = Arc::new(Mutex::new(false));
        let saw_resolve_clone = saw_resolve.clone();

        execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &MemoryFetcher::new(),
            &ZipExtractor,
            move |progress| {
                if matches!(progress, InstallProgress::ResolvingConflicts) {
                    *saw_resolve_clone.lock().unwrap() = true;
                }
            },
        )
        .await
        .unwrap();

        assert!(!*saw_resolve.lock().unwrap());
    }

    #[tokio::test]
    async fn test_download_failure_aborts_before_extract() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        install_existing(&paths, "1.0.0.0");

        let result = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &MemoryFetcher::failing(),
            &ZipExtractor,
            |_| {},
        )
        .await;

        assert!(matches!(
            result,
            Err(InstallError::DownloadFailed { status: Some(404), .. })
        ));
        assert!(!paths.artifact().exists());
        assert_eq!(
            JsonManifestStore.read(paths.target_dir()).unwrap().version,
            "1.0.0.0"
        );
    }

    #[tokio::test]
    async fn test_extract_failure_keeps_previous_manifest() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        install_existing(&paths, "1.0.0.0");

        let result = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_9_9_9_9", None),
            &paths,
            &MemoryFetcher::new(),
            &HalfExtractor,
            |_| {},
        )
        .await;

        assert!(matches!(result, Err(InstallError::ExtractFailed { .. })));
        let manifest = JsonManifestStore.read(paths.target_dir()).unwrap();
        assert_eq!(manifest.version, "1.0.0.0");
        assert!(!paths.staging_dir().exists());
        // The artifact stays behind and is picked up as a conflict next run
        assert!(paths.artifact().exists());
        assert_eq!(conflict::probe(&paths), ConflictState::StaleTargetAndArtifact);
    }

    #[tokio::test]
    async fn test_extract_failure_on_fresh_system_leaves_no_manifest() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());

        let result = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_9_9_9_9", None),
            &paths,
            &MemoryFetcher::new(),
            &HalfExtractor,
            |_| {},
        )
        .await;

        assert!(result.is_err());
        assert!(JsonManifestStore.read(paths.target_dir()).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_package_fails_extract() {
        struct GarbageFetcher;

        impl ArtifactFetcher for GarbageFetcher {
            async fn fetch(&self, _token: &VersionToken, dest: &Path) -> Result<(), InstallError> {
                fs::write(dest, b"not a zip").unwrap();
                Ok(())
            }
        }

        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());

        let result = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &GarbageFetcher,
            &ZipExtractor,
            |_| {},
        )
        .await;

        assert!(matches!(result, Err(InstallError::ExtractFailed { .. })));
        assert!(!paths.target_dir().exists());
    }

    #[tokio::test]
    async fn test_conflict_resolution_failure_aborts_before_fetch() {
        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        // A non-empty directory where the artifact file should be cannot be removed
        fs::create_dir_all(paths.artifact().join("nested")).unwrap();
        let fetcher = MemoryFetcher::new();

        let result = execute(
            &planned(Plan::ProceedOverConflict, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &fetcher,
            &ZipExtractor,
            |_| {},
        )
        .await;

        match result {
            Err(e @ InstallError::ConflictResolutionFailed { .. }) => {
                assert_eq!(e.exit_code(), 6);
            }
            other => panic!("expected ConflictResolutionFailed, got {:?}", other),
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(!paths.target_dir().exists());
    }

    #[tokio::test]
    async fn test_cleanup_failure_still_succeeds() {
        /// Unpacks normally, then swaps the archive for a directory that
        /// `remove_file` refuses to delete.
        #[derive(Clone)]
        struct ArchiveSwappingExtractor;

        impl ArchiveExtractor for ArchiveSwappingExtractor {
            fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), InstallError> {
                ZipExtractor.unpack(archive, dest)?;
                fs::remove_file(archive).unwrap();
                fs::create_dir_all(archive).unwrap();
                Ok(())
            }
        }

        let dir = TempDir::new().unwrap();
        let paths = InstallPaths::in_dir(dir.path());
        let completed = Arc::new(Mutex::new(false));
        let completed_clone = completed.clone();

        let summary = execute(
            &planned(Plan::ProceedClean, "VEXOS_V5_1_1_4_0", None),
            &paths,
            &MemoryFetcher::new(),
            &ArchiveSwappingExtractor,
            move |progress| {
                if progress.is_complete() {
                    *completed_clone.lock().unwrap() = true;
                }
            },
        )
        .await
        .unwrap();

        assert!(summary.changed());
        assert!(*completed.lock().unwrap());
        assert_eq!(
            JsonManifestStore.read(paths.target_dir()).unwrap().version,
            "1.1.4.0"
        );
        assert!(paths.artifact().is_dir());
    }
}
