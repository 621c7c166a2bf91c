//! OS service registration.
//!
//! Polymorphic over the platform selected at startup. Re-registration of
//! an existing same-named entry is deterministic — unit overwrite plus
//! daemon-reload on Linux, delete-then-create on Windows — so exactly
//! one registration exists afterwards.

pub mod linux;
pub mod windows;

use std::path::PathBuf;

use log::warn;

use crate::error::ProvisionError;
use crate::platform::Platform;
use crate::runner::CommandRunner;

/// Everything the platform backend needs to register the service.
/// Built after a successful build; consumed once.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub description: String,
    pub working_dir: PathBuf,
    /// Absolute path of the generated start script.
    pub exec_path: PathBuf,
    /// Seconds the supervisor waits before restarting a failed service.
    pub restart_sec: u32,
    /// Explicit PATH for the service environment.
    pub path_env: String,
    /// Unix user the service runs as (system scope only).
    pub user: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Registered with the OS supervisor and started.
    Started,
    /// No supervisor on this platform; the start script must be run
    /// manually.
    SkippedUnsupported,
}

pub fn register(
    platform: Platform,
    runner: &dyn CommandRunner,
    desc: &ServiceDescriptor,
    scope: &linux::SystemdScope,
) -> Result<Registration, ProvisionError> {
    match platform {
        Platform::LinuxSystemd => {
            linux::register(runner, desc, scope)?;
            Ok(Registration::Started)
        }
        Platform::WindowsScm => {
            windows::register(runner, desc)?;
            Ok(Registration::Started)
        }
        Platform::Unsupported => {
            warn!(
                "no service manager integration for this platform; start {} manually via {}",
                desc.name,
                desc.exec_path.display()
            );
            Ok(Registration::SkippedUnsupported)
        }
    }
}

/// Whether the registered service is currently running.
pub fn status(
    platform: Platform,
    runner: &dyn CommandRunner,
    name: &str,
    scope: &linux::SystemdScope,
) -> Result<bool, ProvisionError> {
    match platform {
        Platform::LinuxSystemd => linux::is_active(runner, name, scope),
        Platform::WindowsScm => windows::is_running(runner, name),
        Platform::Unsupported => Err(ProvisionError::RegistrationFailure(
            "no service manager integration for this platform".to_string(),
        )),
    }
}

/// Stop the service and remove its registration. Safe to call when the
/// service was never registered.
pub fn unregister(
    platform: Platform,
    runner: &dyn CommandRunner,
    name: &str,
    scope: &linux::SystemdScope,
) -> Result<(), ProvisionError> {
    match platform {
        Platform::LinuxSystemd => linux::unregister(runner, name, scope),
        Platform::WindowsScm => windows::unregister(runner, name),
        Platform::Unsupported => {
            warn!("no service manager integration for this platform; nothing to unregister");
            Ok(())
        }
    }
}
