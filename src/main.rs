//! vexos-dl CLI entry point
//!
//! Downloads and installs VEXos firmware into a local directory.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vexos_dl::{
    HttpRemote, InstallError, InstallPaths, InstallProgress, InstallRequest, InstallSummary,
    Plan, RemoteOptions, SkipReason, Updater, DEFAULT_BASE_URL,
};

/// Exit code for a run skipped because of leftovers from an earlier run.
const EXIT_CONFLICT: u8 = 1;

/// VEXos firmware downloader
#[derive(Debug, Parser)]
#[command(name = "vexos-dl", disable_version_flag = true)]
struct Cli {
    /// Install even if there are conflicts or no available update
    #[arg(short, long)]
    force: bool,

    /// Install a specific version (format: "VEXOS_V5_X_X_X_X"); implies --force
    #[arg(short = 'v', long = "version", value_name = "TOKEN")]
    version: Option<String>,

    /// Directory holding the downloaded package and the vexos/ install
    #[arg(short, long, env = "VEXOS_DL_DIR", default_value = ".")]
    dir: PathBuf,

    /// Content server base URL
    #[arg(long, env = "VEXOS_DL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "VEXOS_DL_TIMEOUT", default_value_t = 300)]
    timeout: u64,
}

impl Cli {
    fn request(&self) -> InstallRequest {
        InstallRequest {
            force: self.force || self.version.is_some(),
            version: self.version.clone(),
        }
    }

    fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Fix: {}", e.fix_suggestion());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(u8::MAX))
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, InstallError> {
    let request = cli.request();
    let options = cli.remote_options();
    let catalog_url = options.catalog_url();
    let remote = HttpRemote::new(options).map_err(|e| InstallError::CatalogUnavailable {
        url: catalog_url,
        status: None,
        source: Some(e.into()),
    })?;
    let updater = Updater::new(InstallPaths::in_dir(&cli.dir), remote.clone(), remote);

    if request.version.is_none() {
        println!("Getting latest version...");
    }
    let planned = updater.plan(&request).await?;
    match &request.version {
        Some(_) => println!("Version specified: {}", planned.target),
        None => println!("Latest version: {}", planned.target.version()),
    }
    match planned.installed {
        Some(current) if planned.plan == Plan::Skip(SkipReason::UpToDate) => {
            println!("Your VEXos installation ({}) is up to date.", current)
        }
        Some(current) if current >= planned.target.version() => {
            println!("Your VEXos installation is up to date, but continuing anyway.")
        }
        Some(current) => println!("An update is available (currently installed: {}).", current),
        None => println!("No VEXos installation found. Fresh installation will be performed."),
    }

    let summary = updater.execute(&planned, print_progress).await?;
    match summary {
        InstallSummary::Unchanged {
            reason: SkipReason::Conflict(state),
            ..
        } => {
            println!("VEXos package already downloaded ({}).", state);
            println!(
                "Rerun with --force, or delete {} and try again.",
                updater.paths().artifact().display()
            );
            Ok(ExitCode::from(EXIT_CONFLICT))
        }
        InstallSummary::Unchanged { .. } => Ok(ExitCode::SUCCESS),
        InstallSummary::Installed { installed, .. } => {
            println!("VEXos successfully installed.");
            println!("OLD VERSION: {}", summary.old_version_label());
            println!("NEW VERSION: {}", installed);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_progress(progress: InstallProgress) {
    match progress {
        InstallProgress::Started { .. } => {}
        InstallProgress::Completed { version } => println!("Installed VEXos {}.", version),
        other => println!("{}...", other.description()),
    }
}
