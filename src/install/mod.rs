//! Carrying out an install plan.
//!
//! [`execute`] runs the steps of a [`PlannedInstall`](crate::PlannedInstall)
//! in order and reports each one through an [`InstallProgress`] callback.
//! Failures are typed [`InstallError`]s carrying a fix suggestion.
//!
//! # Example
//!
//! ```rust,no_run
//! use vexos_dl::{InstallError, InstallProgress};
//!
//! fn report(result: Result<(), InstallError>) {
//!     if let Err(e) = result {
//!         eprintln!("Error: {}", e);
//!         eprintln!("Fix: {}", e.fix_suggestion());
//!         std::process::exit(e.exit_code());
//!     }
//! }
//!
//! fn on_progress(progress: InstallProgress) {
//!     println!("{}", progress.description());
//! }
//! ```

mod errors;
mod executor;
mod progress;
mod types;

pub use errors::{BoxError, InstallError};
pub use executor::execute;
pub use progress::InstallProgress;
pub use types::{InstallStep, InstallSummary};
