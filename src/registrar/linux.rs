//! systemd backend.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::ServiceDescriptor;
use crate::error::ProvisionError;
use crate::fsutil;
use crate::platform;
use crate::runner::{CommandRunner, RunOutput};

/// System vs user systemd scope. Root installs under
/// `/etc/systemd/system`; a non-privileged user gets a
/// `systemctl --user` unit under `~/.config/systemd/user`.
#[derive(Debug, Clone)]
pub struct SystemdScope {
    pub unit_dir: PathBuf,
    pub user_mode: bool,
}

impl SystemdScope {
    pub fn detect() -> Result<Self, ProvisionError> {
        if platform::is_root() {
            Ok(Self {
                unit_dir: PathBuf::from("/etc/systemd/system"),
                user_mode: false,
            })
        } else {
            let home = dirs::home_dir().ok_or_else(|| {
                ProvisionError::RegistrationFailure(
                    "could not determine the home directory for the user unit".to_string(),
                )
            })?;
            Ok(Self {
                unit_dir: home.join(".config").join("systemd").join("user"),
                user_mode: true,
            })
        }
    }
}

/// Generate the unit file content.
pub fn unit_content(desc: &ServiceDescriptor, scope: &SystemdScope) -> String {
    let mut content = String::with_capacity(512);

    content.push_str("[Unit]\n");
    content.push_str(&format!("Description={}\n", desc.description));
    content.push_str("Wants=network-online.target\n");
    content.push_str("After=network-online.target\n");
    content.push('\n');

    content.push_str("[Service]\n");
    content.push_str("Type=simple\n");
    content.push_str(&format!("WorkingDirectory={}\n", desc.working_dir.display()));
    content.push_str(&format!("ExecStart={}\n", desc.exec_path.display()));
    content.push_str("Restart=always\n");
    content.push_str(&format!("RestartSec={}s\n", desc.restart_sec));
    content.push_str(&format!("Environment=\"PATH={}\"\n", desc.path_env));
    // User= only makes sense under the system manager; user units
    // already run as their owner.
    if !scope.user_mode
        && let Some(user) = &desc.user
    {
        content.push_str(&format!("User={user}\n"));
    }
    content.push('\n');

    content.push_str("[Install]\n");
    if scope.user_mode {
        content.push_str("WantedBy=default.target\n");
    } else {
        content.push_str("WantedBy=multi-user.target\n");
    }

    content
}

/// Install the unit file and bring the service up: write, daemon-reload,
/// enable, restart. Writing over a previous unit plus `restart` makes
/// re-registration converge on the same end state.
pub fn register(
    runner: &dyn CommandRunner,
    desc: &ServiceDescriptor,
    scope: &SystemdScope,
) -> Result<(), ProvisionError> {
    let unit_name = format!("{}.service", desc.name);
    let unit_path = scope.unit_dir.join(&unit_name);
    if unit_path.exists() {
        debug!("replacing existing unit at {}", unit_path.display());
    }
    fsutil::write_file_atomic(&unit_path, &unit_content(desc, scope))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&unit_path)?.permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&unit_path, perms)?;
    }

    systemctl(runner, scope, &["daemon-reload"])?;
    systemctl(runner, scope, &["enable", &unit_name])?;
    systemctl(runner, scope, &["restart", &unit_name])?;
    info!("registered and started {unit_name}");
    Ok(())
}

/// `systemctl is-active` truthiness; inactive is a state, not an error.
pub fn is_active(
    runner: &dyn CommandRunner,
    name: &str,
    scope: &SystemdScope,
) -> Result<bool, ProvisionError> {
    let unit_name = format!("{name}.service");
    let out = systemctl_raw(runner, scope, &["is-active", &unit_name])?;
    Ok(out.success)
}

/// Stop, disable and remove the unit. Stop/disable of an absent unit is
/// tolerated so unregistration is idempotent.
pub fn unregister(
    runner: &dyn CommandRunner,
    name: &str,
    scope: &SystemdScope,
) -> Result<(), ProvisionError> {
    let unit_name = format!("{name}.service");

    let stop = systemctl_raw(runner, scope, &["stop", &unit_name])?;
    if !stop.success {
        debug!("systemctl stop {unit_name}: {}", stop.stderr.trim());
    }
    let disable = systemctl_raw(runner, scope, &["disable", &unit_name])?;
    if !disable.success {
        debug!("systemctl disable {unit_name}: {}", disable.stderr.trim());
    }

    let unit_path = scope.unit_dir.join(&unit_name);
    if unit_path.exists() {
        fs::remove_file(&unit_path)?;
    }

    systemctl(runner, scope, &["daemon-reload"])?;
    info!("unregistered {unit_name}");
    Ok(())
}

/// Run systemctl, treating a non-zero exit as a registration failure.
fn systemctl(
    runner: &dyn CommandRunner,
    scope: &SystemdScope,
    args: &[&str],
) -> Result<RunOutput, ProvisionError> {
    let out = systemctl_raw(runner, scope, args)?;
    if !out.success {
        return Err(ProvisionError::RegistrationFailure(format!(
            "systemctl {} failed: {}",
            args.join(" "),
            out.stderr.trim()
        )));
    }
    Ok(out)
}

/// Run systemctl, only failing when it cannot be spawned at all.
fn systemctl_raw(
    runner: &dyn CommandRunner,
    scope: &SystemdScope,
    args: &[&str],
) -> Result<RunOutput, ProvisionError> {
    let mut full: Vec<&str> = Vec::with_capacity(args.len() + 1);
    if scope.user_mode {
        full.push("--user");
    }
    full.extend_from_slice(args);
    runner
        .run(Path::new("systemctl"), &full, None)
        .map_err(|e| {
            ProvisionError::RegistrationFailure(format!("could not invoke systemctl: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct FakeSystemctl {
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for FakeSystemctl {
        fn run(
            &self,
            program: &Path,
            args: &[&str],
            _cwd: Option<&Path>,
        ) -> std::io::Result<RunOutput> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program.display(), args.join(" ")));
            Ok(RunOutput {
                status_code: Some(0),
                success: true,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "wg-backend".to_string(),
            description: "WireGuard configuration backend".to_string(),
            working_dir: PathBuf::from("/opt/wg-backend"),
            exec_path: PathBuf::from("/opt/wg-backend/start.sh"),
            restart_sec: 5,
            path_env: "/usr/bin:/home/wg/.cargo/bin".to_string(),
            user: Some("wg".to_string()),
        }
    }

    fn scope_in(dir: &Path, user_mode: bool) -> SystemdScope {
        SystemdScope {
            unit_dir: dir.to_path_buf(),
            user_mode,
        }
    }

    #[test]
    fn unit_content_carries_restart_policy_path_and_workdir() {
        let scope = scope_in(Path::new("/etc/systemd/system"), false);
        let unit = unit_content(&descriptor(), &scope);
        assert!(unit.contains("Restart=always\n"));
        assert!(unit.contains("RestartSec=5s\n"));
        assert!(unit.contains("WorkingDirectory=/opt/wg-backend\n"));
        assert!(unit.contains("ExecStart=/opt/wg-backend/start.sh\n"));
        assert!(unit.contains("Environment=\"PATH=/usr/bin:/home/wg/.cargo/bin\"\n"));
        assert!(unit.contains("User=wg\n"));
        assert!(unit.contains("WantedBy=multi-user.target\n"));
    }

    #[test]
    fn user_scope_omits_user_directive() {
        let scope = scope_in(Path::new("/home/wg/.config/systemd/user"), true);
        let unit = unit_content(&descriptor(), &scope);
        assert!(!unit.contains("User="));
        assert!(unit.contains("WantedBy=default.target\n"));
    }

    #[test]
    fn register_writes_unit_and_reloads_enables_restarts() {
        let dir = tempdir().unwrap();
        let scope = scope_in(dir.path(), true);
        let runner = FakeSystemctl {
            calls: RefCell::new(Vec::new()),
        };
        register(&runner, &descriptor(), &scope).unwrap();

        assert!(dir.path().join("wg-backend.service").exists());
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].ends_with("--user daemon-reload"));
        assert!(calls[1].ends_with("--user enable wg-backend.service"));
        assert!(calls[2].ends_with("--user restart wg-backend.service"));
    }

    #[test]
    fn reregistration_leaves_exactly_one_unit_file() {
        let dir = tempdir().unwrap();
        let scope = scope_in(dir.path(), true);
        let runner = FakeSystemctl {
            calls: RefCell::new(Vec::new()),
        };
        register(&runner, &descriptor(), &scope).unwrap();
        register(&runner, &descriptor(), &scope).unwrap();

        let units: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "service"))
            .collect();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn unregister_removes_unit_file() {
        let dir = tempdir().unwrap();
        let scope = scope_in(dir.path(), true);
        let runner = FakeSystemctl {
            calls: RefCell::new(Vec::new()),
        };
        register(&runner, &descriptor(), &scope).unwrap();
        unregister(&runner, "wg-backend", &scope).unwrap();
        assert!(!dir.path().join("wg-backend.service").exists());
    }
}
