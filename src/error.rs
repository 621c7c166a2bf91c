//! Provisioning error taxonomy.
//!
//! `MissingPrerequisite`, `InstallFailure`, `BuildFailure` and
//! `RegistrationFailure` abort the run. `SyncFailure` is only fatal for
//! an initial clone; a failed update of an existing checkout is
//! downgraded to a warning by the sync layer and never reaches this type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A required tool is absent and there is no installer path for it
    /// on this platform.
    #[error("missing prerequisite `{tool}`: {reason}")]
    MissingPrerequisite { tool: String, reason: String },

    /// The installer was invoked but the tool is still not usable.
    #[error("failed to install `{tool}`: {detail}")]
    InstallFailure { tool: String, detail: String },

    /// The repository could not be cloned at all.
    #[error("repository sync failed: {0}")]
    SyncFailure(String),

    /// A dependency-install or build step exited non-zero.
    #[error("{step} failed (exit code {code}) in {}: {stderr}", .dir.display())]
    BuildFailure {
        step: &'static str,
        code: i32,
        dir: PathBuf,
        stderr: String,
    },

    /// The OS service manager rejected the registration. Completed
    /// build/install work is left in place.
    #[error("service registration failed: {0}")]
    RegistrationFailure(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
