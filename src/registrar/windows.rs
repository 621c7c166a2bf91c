//! Windows SCM backend via `sc.exe`.
//!
//! Replacement is delete-then-create: an existing same-named service is
//! stopped and deleted before the new registration, so exactly one
//! registration exists afterwards.

use std::path::Path;

use log::{debug, info};

use super::ServiceDescriptor;
use crate::error::ProvisionError;
use crate::runner::{CommandRunner, RunOutput};

pub fn register(
    runner: &dyn CommandRunner,
    desc: &ServiceDescriptor,
) -> Result<(), ProvisionError> {
    if service_exists(runner, &desc.name)? {
        debug!("service {} already registered, replacing", desc.name);
        let stop = sc_raw(runner, &["stop", &desc.name])?;
        if !stop.success {
            debug!("sc stop {}: {}", desc.name, stop.stderr.trim());
        }
        sc(runner, &["delete", &desc.name])?;
    }

    // The SCM cannot launch a batch script directly; wrap it in cmd.
    // sc.exe expects the value as a separate token after each `option=`.
    let bin_path = format!("cmd.exe /c \"{}\"", desc.exec_path.display());
    sc(
        runner,
        &[
            "create",
            &desc.name,
            "binPath=",
            &bin_path,
            "start=",
            "auto",
            "DisplayName=",
            &desc.name,
        ],
    )?;
    sc(runner, &["description", &desc.name, &desc.description])?;

    // Escalating restart delays; failure count resets daily.
    let actions = format!(
        "restart/{}/restart/10000/restart/30000",
        desc.restart_sec * 1000
    );
    sc(
        runner,
        &[
            "failure",
            &desc.name,
            "reset=",
            "86400",
            "actions=",
            &actions,
        ],
    )?;

    sc(runner, &["start", &desc.name])?;
    info!("registered and started service {}", desc.name);
    Ok(())
}

pub fn service_exists(runner: &dyn CommandRunner, name: &str) -> Result<bool, ProvisionError> {
    let out = sc_raw(runner, &["query", name])?;
    Ok(out.success)
}

pub fn is_running(runner: &dyn CommandRunner, name: &str) -> Result<bool, ProvisionError> {
    let out = sc_raw(runner, &["query", name])?;
    Ok(out.success && out.stdout.contains("RUNNING"))
}

/// Stop and delete the registration. A service that was never
/// registered is a no-op.
pub fn unregister(runner: &dyn CommandRunner, name: &str) -> Result<(), ProvisionError> {
    if !service_exists(runner, name)? {
        debug!("service {name} not registered, nothing to remove");
        return Ok(());
    }
    let stop = sc_raw(runner, &["stop", name])?;
    if !stop.success {
        debug!("sc stop {name}: {}", stop.stderr.trim());
    }
    sc(runner, &["delete", name])?;
    info!("unregistered service {name}");
    Ok(())
}

/// Run sc.exe, treating a non-zero exit as a registration failure.
fn sc(runner: &dyn CommandRunner, args: &[&str]) -> Result<RunOutput, ProvisionError> {
    let out = sc_raw(runner, args)?;
    if !out.success {
        return Err(ProvisionError::RegistrationFailure(format!(
            "sc {} failed: {}",
            args.join(" "),
            out.stderr.trim()
        )));
    }
    Ok(out)
}

/// Run sc.exe, only failing when it cannot be spawned at all.
fn sc_raw(runner: &dyn CommandRunner, args: &[&str]) -> Result<RunOutput, ProvisionError> {
    runner
        .run(Path::new("sc.exe"), args, None)
        .map_err(|e| ProvisionError::RegistrationFailure(format!("could not invoke sc.exe: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Scripted SCM: `query` succeeds for the names in `existing`; every
    /// other call succeeds and is recorded.
    struct FakeScm {
        calls: RefCell<Vec<String>>,
        existing: Vec<&'static str>,
    }

    impl FakeScm {
        fn new(existing: Vec<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                existing,
            }
        }
    }

    impl CommandRunner for FakeScm {
        fn run(
            &self,
            _program: &Path,
            args: &[&str],
            _cwd: Option<&Path>,
        ) -> std::io::Result<RunOutput> {
            self.calls.borrow_mut().push(args.join(" "));
            let (success, stdout) = if args.first() == Some(&"query") {
                let known = args.get(1).is_some_and(|n| self.existing.contains(n));
                (known, if known { "STATE : 4 RUNNING".into() } else { String::new() })
            } else {
                (true, String::new())
            };
            Ok(RunOutput {
                status_code: Some(if success { 0 } else { 1060 }),
                success,
                stdout,
                stderr: String::new(),
            })
        }
    }

    fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "wg-backend".to_string(),
            description: "WireGuard configuration backend".to_string(),
            working_dir: PathBuf::from(r"C:\wg\wg-backend"),
            exec_path: PathBuf::from(r"C:\wg\wg-backend\start.bat"),
            restart_sec: 5,
            path_env: r"C:\Users\wg\.cargo\bin".to_string(),
            user: None,
        }
    }

    #[test]
    fn fresh_registration_creates_without_deleting() {
        let runner = FakeScm::new(vec![]);
        register(&runner, &descriptor()).unwrap();
        let calls = runner.calls.borrow();
        assert!(!calls.iter().any(|c| c.starts_with("delete")));
        let create: Vec<_> = calls.iter().filter(|c| c.starts_with("create")).collect();
        assert_eq!(create.len(), 1);
        assert!(create[0].contains("start= auto"));
        assert!(create[0].contains("start.bat"));
        assert!(calls.last().unwrap().starts_with("start wg-backend"));
    }

    #[test]
    fn existing_service_is_replaced_delete_then_create() {
        let runner = FakeScm::new(vec!["wg-backend"]);
        register(&runner, &descriptor()).unwrap();
        let calls = runner.calls.borrow();
        let delete_pos = calls.iter().position(|c| c.starts_with("delete")).unwrap();
        let create_pos = calls.iter().position(|c| c.starts_with("create")).unwrap();
        assert!(delete_pos < create_pos, "delete must precede create");
        assert_eq!(calls.iter().filter(|c| c.starts_with("create")).count(), 1);
    }

    #[test]
    fn restart_policy_is_configured() {
        let runner = FakeScm::new(vec![]);
        register(&runner, &descriptor()).unwrap();
        let calls = runner.calls.borrow();
        let failure = calls.iter().find(|c| c.starts_with("failure")).unwrap();
        assert!(failure.contains("restart/5000"));
    }

    #[test]
    fn is_running_parses_query_output() {
        let runner = FakeScm::new(vec!["wg-backend"]);
        assert!(is_running(&runner, "wg-backend").unwrap());
        assert!(!is_running(&runner, "other").unwrap());
    }

    #[test]
    fn unregister_missing_service_is_a_noop() {
        let runner = FakeScm::new(vec![]);
        unregister(&runner, "wg-backend").unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("query"));
    }
}
