//! Idempotent tool installation.

use std::path::{Path, PathBuf};

use log::{debug, info};

use super::probe::{self, ToolProbe};
use super::{EnsureOutcome, InstallStrategy, ToolRequirement};
use crate::error::ProvisionError;
use crate::runner::CommandRunner;

/// Ensure `req` is satisfied. Already-present tools are a no-op. After a
/// strategy runs, the command-search path is re-resolved and the tool
/// re-probed; an installer that "succeeds" without producing the tool is
/// an install failure.
///
/// `elevate` prefixes package-manager invocations with `sudo` (Linux
/// package installs need root; vendor scripts install per-user).
pub fn ensure(
    req: &ToolRequirement,
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
    elevate: bool,
) -> Result<EnsureOutcome, ProvisionError> {
    if probe::is_available(probe, runner, req) {
        debug!("{} already satisfied", req.name);
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    match &req.strategy {
        InstallStrategy::None => Err(ProvisionError::MissingPrerequisite {
            tool: req.name.to_string(),
            reason: "no install strategy for this platform".to_string(),
        }),
        InstallStrategy::PackageManager { program, args } => {
            info!("installing {} via {}", req.name, program);
            let out = if elevate {
                let mut sudo_args = vec![*program];
                sudo_args.extend_from_slice(args);
                runner.run(Path::new("sudo"), &sudo_args, None)
            } else {
                runner.run(Path::new(program), args, None)
            }
            .map_err(|e| spawn_failure(req, &e))?;
            if !out.success {
                return Err(install_failure(req, out.code(), &out.stderr));
            }
            confirm_installed(req, probe, runner)
        }
        InstallStrategy::VendorScript { shell_command } => {
            info!("running vendor install script for {}", req.name);
            let out = runner
                .run(Path::new("sh"), &["-c", shell_command], None)
                .map_err(|e| spawn_failure(req, &e))?;
            if !out.success {
                return Err(install_failure(req, out.code(), &out.stderr));
            }
            confirm_installed(req, probe, runner)
        }
    }
}

/// User-local toolchain bin directories. Appended to PATH after installs
/// and embedded into the start script and service environment, since
/// service managers start processes with a minimal inherited PATH.
pub fn user_local_bin_dirs() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join(".cargo").join("bin"),
        home.join(".local").join("bin"),
    ]
}

/// Installers commonly extend the login-shell PATH without affecting the
/// current process. Append the user-local bin directories to our own
/// PATH so the follow-up probe can see freshly installed tools.
pub fn extend_search_path() {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = std::env::split_paths(&current).collect();
    let mut changed = false;
    for dir in user_local_bin_dirs() {
        if !paths.contains(&dir) {
            paths.push(dir);
            changed = true;
        }
    }
    if changed
        && let Ok(joined) = std::env::join_paths(&paths)
    {
        // Single-threaded tool; no other thread reads the environment.
        unsafe { std::env::set_var("PATH", joined) };
    }
}

fn confirm_installed(
    req: &ToolRequirement,
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
) -> Result<EnsureOutcome, ProvisionError> {
    extend_search_path();
    if probe::is_available(probe, runner, req) {
        Ok(EnsureOutcome::Installed)
    } else {
        Err(ProvisionError::InstallFailure {
            tool: req.name.to_string(),
            detail: "installer completed but the tool is still absent from PATH".to_string(),
        })
    }
}

fn spawn_failure(req: &ToolRequirement, e: &std::io::Error) -> ProvisionError {
    ProvisionError::InstallFailure {
        tool: req.name.to_string(),
        detail: format!("could not invoke installer: {e}"),
    }
}

fn install_failure(req: &ToolRequirement, code: i32, stderr: &str) -> ProvisionError {
    ProvisionError::InstallFailure {
        tool: req.name.to_string(),
        detail: format!("installer exited with code {code}: {}", stderr.trim()),
    }
}
