//! The plan-then-execute entry point.
//!
//! [`Updater`] owns the install paths and the collaborators, reads the
//! local state itself, and hands it to [`plan`](crate::plan()) and
//! [`execute`](crate::execute). It does not lock anything: two updaters
//! pointed at the same paths must not run at once.

use crate::archive::{ArchiveExtractor, ZipExtractor};
use crate::manifest::{JsonManifestStore, ManifestStore};
use crate::plan::{InstallRequest, PlannedInstall};
use crate::remote::{ArtifactFetcher, CatalogFetcher};
use crate::{conflict, install, plan, InstallError, InstallPaths, InstallProgress, InstallSummary};
use tracing::debug;

/// Installs VEXos firmware into a fixed set of paths.
///
/// # Example
///
/// ```rust,no_run
/// use vexos_dl::{HttpRemote, InstallPaths, InstallRequest, RemoteOptions, Updater};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let remote = HttpRemote::new(RemoteOptions::default()).unwrap();
///     let updater = Updater::new(InstallPaths::in_dir("."), remote.clone(), remote);
///
///     match updater.run(&InstallRequest::latest(), |_| {}).await {
///         Ok(summary) => println!("Now on {:?}", summary.current_version()),
///         Err(e) => eprintln!("{} ({})", e, e.fix_suggestion()),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Updater<C, A, X = ZipExtractor, M = JsonManifestStore> {
    paths: InstallPaths,
    catalog: C,
    artifacts: A,
    extractor: X,
    manifests: M,
}

impl<C, A> Updater<C, A>
where
    C: CatalogFetcher,
    A: ArtifactFetcher,
{
    /// Create an updater using zip extraction and JSON manifests.
    pub fn new(paths: InstallPaths, catalog: C, artifacts: A) -> Self {
        Self {
            paths,
            catalog,
            artifacts,
            extractor: ZipExtractor,
            manifests: JsonManifestStore,
        }
    }
}

impl<C, A, X, M> Updater<C, A, X, M>
where
    C: CatalogFetcher,
    A: ArtifactFetcher,
    X: ArchiveExtractor,
    M: ManifestStore,
{
    pub fn with_extractor<X2: ArchiveExtractor>(self, extractor: X2) -> Updater<C, A, X2, M> {
        Updater {
            paths: self.paths,
            catalog: self.catalog,
            artifacts: self.artifacts,
            extractor,
            manifests: self.manifests,
        }
    }

    pub fn with_manifest_store<M2: ManifestStore>(self, manifests: M2) -> Updater<C, A, X, M2> {
        Updater {
            paths: self.paths,
            catalog: self.catalog,
            artifacts: self.artifacts,
            extractor: self.extractor,
            manifests,
        }
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.paths
    }

    /// Read the local state and decide what to do. Touches nothing on disk.
    pub async fn plan(&self, request: &InstallRequest) -> Result<PlannedInstall, InstallError> {
        let installed = self.manifests.read(self.paths.target_dir());
        let state = conflict::probe(&self.paths);
        debug!(
            "Installed manifest: {:?}, leftover state: {}",
            installed.as_ref().map(|m| m.version.as_str()),
            state
        );
        plan::plan(request, installed.as_ref(), state, &self.catalog).await
    }

    /// Carry out a plan previously returned by [`Updater::plan`].
    pub async fn execute<F>(
        &self,
        planned: &PlannedInstall,
        on_progress: F,
    ) -> Result<InstallSummary, InstallError>
    where
        X: Clone + Send + 'static,
        F: Fn(InstallProgress),
    {
        install::execute(
            planned,
            &self.paths,
            &self.artifacts,
            &self.extractor,
            on_progress,
        )
        .await
    }

    /// Plan and execute in one go.
    pub async fn run<F>(
        &self,
        request: &InstallRequest,
        on_progress: F,
    ) -> Result<InstallSummary, InstallError>
    where
        X: Clone + Send + 'static,
        F: Fn(InstallProgress),
    {
        let planned = self.plan(request).await?;
        self.execute(&planned, on_progress).await
    }
}
