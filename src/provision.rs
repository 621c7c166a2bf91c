//! The provisioning sequence.
//!
//! Toolchain ensure → repository sync → build → start script → service
//! registration. Every stage prints its intent before acting and its
//! outcome after, so a failed run reads linearly. Each stage is a hard
//! precondition for the next; the one tolerated failure is a repository
//! update on an existing checkout.

use std::io::Write;
use std::path::PathBuf;

use log::warn;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::{ProjectLocation, ProvisionConfig};
use crate::error::ProvisionError;
use crate::launch;
use crate::platform::{self, Platform};
use crate::project;
use crate::registrar::linux::SystemdScope;
use crate::registrar::{self, Registration, ServiceDescriptor};
use crate::repo::{self, SyncOutcome};
use crate::runner::CommandRunner;
use crate::tools::probe::ToolProbe;
use crate::tools::{self, EnsureOutcome, install};

const SYSTEM_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

pub fn run(
    config: &ProvisionConfig,
    location: &ProjectLocation,
    platform_kind: Platform,
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
    scope: &SystemdScope,
) -> Result<(), ProvisionError> {
    let mut out = StandardStream::stdout(ColorChoice::Auto);

    stage(
        &mut out,
        &format!(
            "provisioning {} on {platform_kind}",
            config.service_name
        ),
    );

    // Package installs need root; vendor scripts install per-user.
    let elevate = platform_kind == Platform::LinuxSystemd && !platform::is_root();
    for req in tools::required_tools(platform_kind) {
        stage(&mut out, &format!("checking {}", req.name));
        match install::ensure(&req, probe, runner, elevate)? {
            EnsureOutcome::AlreadyPresent => {
                stage_ok(&mut out, &format!("{} present", req.name));
            }
            EnsureOutcome::Installed => stage_ok(&mut out, &format!("{} installed", req.name)),
        }
    }

    let git = resolve(probe, "git")?;
    let npm = resolve(probe, "npm")?;
    let cargo = resolve(probe, "cargo")?;

    stage(
        &mut out,
        &format!(
            "syncing {} into {}",
            location.repository_url,
            location.project_dir.display()
        ),
    );
    let sync = repo::sync(runner, &git, &location.repository_url, &location.project_dir)?;
    if let Some(warning) = &sync.warning {
        warn!("{warning}");
        stage_warn(&mut out, warning);
    } else {
        match sync.outcome {
            SyncOutcome::Cloned => stage_ok(&mut out, "repository cloned"),
            SyncOutcome::Updated => stage_ok(&mut out, "repository updated"),
            SyncOutcome::UpToDate => stage_ok(&mut out, "repository already up to date"),
        }
    }

    stage(&mut out, "installing dependencies and building release binary");
    project::build(runner, &npm, &cargo, &location.project_dir)?;
    stage_ok(&mut out, "build complete");

    stage(&mut out, "writing start script");
    let path_dirs = install::user_local_bin_dirs();
    let script = launch::write_start_script(
        platform_kind,
        &location.project_dir,
        &path_dirs,
        &config.run_step,
    )?;
    stage_ok(&mut out, &format!("start script at {}", script.display()));

    let descriptor = ServiceDescriptor {
        name: config.service_name.clone(),
        description: config.service_description.clone(),
        working_dir: location.project_dir.clone(),
        exec_path: script.clone(),
        restart_sec: config.restart_sec,
        path_env: service_path_env(&path_dirs),
        user: invoking_user(),
    };

    stage(&mut out, &format!("registering service {}", descriptor.name));
    match registrar::register(platform_kind, runner, &descriptor, scope) {
        Ok(Registration::Started) => {
            stage_ok(
                &mut out,
                &format!("service {} registered and started", descriptor.name),
            );
            Ok(())
        }
        Ok(Registration::SkippedUnsupported) => {
            stage_warn(
                &mut out,
                &format!(
                    "no service manager on this platform; start manually via {}",
                    script.display()
                ),
            );
            Ok(())
        }
        Err(e) => {
            // Completed build/install work stays in place; only the
            // supervisor handoff is missing.
            stage_warn(
                &mut out,
                &format!(
                    "build finished but registration failed; start manually via {}",
                    script.display()
                ),
            );
            Err(e)
        }
    }
}

fn resolve(probe: &dyn ToolProbe, name: &str) -> Result<PathBuf, ProvisionError> {
    probe
        .resolve(name)
        .ok_or_else(|| ProvisionError::MissingPrerequisite {
            tool: name.to_string(),
            reason: "not found on PATH after toolchain setup".to_string(),
        })
}

/// Explicit PATH for the service unit: user-local toolchain dirs first,
/// then the standard system directories.
fn service_path_env(path_dirs: &[PathBuf]) -> String {
    let mut parts: Vec<String> = path_dirs.iter().map(|d| d.display().to_string()).collect();
    parts.push(SYSTEM_PATH.to_string());
    parts.join(":")
}

/// Under sudo, register the service to run as the invoking user rather
/// than root.
fn invoking_user() -> Option<String> {
    std::env::var("SUDO_USER").ok().filter(|u| !u.is_empty())
}

fn stage(out: &mut StandardStream, msg: &str) {
    let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(out, "→ {msg}");
    let _ = out.reset();
}

fn stage_ok(out: &mut StandardStream, msg: &str) {
    let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = writeln!(out, "✓ {msg}");
    let _ = out.reset();
}

fn stage_warn(out: &mut StandardStream, msg: &str) {
    let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(out, "⚠ {msg}");
    let _ = out.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_path_env_puts_user_dirs_first() {
        let dirs = vec![PathBuf::from("/home/wg/.cargo/bin")];
        let path = service_path_env(&dirs);
        assert!(path.starts_with("/home/wg/.cargo/bin:"));
        assert!(path.ends_with(SYSTEM_PATH));
    }

    #[test]
    fn service_path_env_without_user_dirs_is_system_only() {
        assert_eq!(service_path_env(&[]), SYSTEM_PATH);
    }
}
