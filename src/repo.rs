//! Repository clone/update.
//!
//! Clone when the local path is absent, otherwise fast-forward. A failed
//! update is deliberately non-fatal: the existing checkout is assumed
//! usable and the run continues with a warning.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::ProvisionError;
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    UpToDate,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub outcome: SyncOutcome,
    /// Set when an update failed and the existing checkout is used as-is.
    pub warning: Option<String>,
}

pub fn sync(
    runner: &dyn CommandRunner,
    git: &Path,
    remote_url: &str,
    local_path: &Path,
) -> Result<SyncResult, ProvisionError> {
    if !local_path.exists() {
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let dest = local_path.display().to_string();
        let out = runner
            .run(git, &["clone", remote_url, &dest], None)
            .map_err(|e| ProvisionError::SyncFailure(format!("could not invoke git: {e}")))?;
        if !out.success {
            return Err(ProvisionError::SyncFailure(format!(
                "git clone of {remote_url} failed: {}",
                out.stderr.trim()
            )));
        }
        return Ok(SyncResult {
            outcome: SyncOutcome::Cloned,
            warning: None,
        });
    }

    debug!("existing checkout at {}, pulling", local_path.display());
    match runner.run(git, &["pull", "--ff-only"], Some(local_path)) {
        Ok(out) if out.success => {
            let outcome = if out.stdout.contains("Already up to date") {
                SyncOutcome::UpToDate
            } else {
                SyncOutcome::Updated
            };
            Ok(SyncResult {
                outcome,
                warning: None,
            })
        }
        Ok(out) => Ok(SyncResult {
            outcome: SyncOutcome::UpToDate,
            warning: Some(format!(
                "git pull failed ({}); continuing with the existing checkout",
                out.stderr.trim()
            )),
        }),
        Err(e) => Ok(SyncResult {
            outcome: SyncOutcome::UpToDate,
            warning: Some(format!(
                "could not invoke git pull ({e}); continuing with the existing checkout"
            )),
        }),
    }
}
