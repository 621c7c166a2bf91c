//! Host platform selection.
//!
//! The platform is detected exactly once at startup and passed to every
//! platform-polymorphic component; no call site re-tests OS identity.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux with systemd as the service supervisor.
    LinuxSystemd,
    /// Windows with the Service Control Manager.
    WindowsScm,
    /// No supervisor integration; provisioning still builds the project
    /// and writes the start script.
    Unsupported,
}

impl Platform {
    pub fn detect() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "linux")] {
                Platform::LinuxSystemd
            } else if #[cfg(target_os = "windows")] {
                Platform::WindowsScm
            } else {
                Platform::Unsupported
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::LinuxSystemd => write!(f, "linux/systemd"),
            Platform::WindowsScm => write!(f, "windows/scm"),
            Platform::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Whether the process runs as root; selects the system vs user systemd
/// scope and whether package installs need `sudo`.
#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::getuid().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_target_os() {
        let platform = Platform::detect();
        #[cfg(target_os = "linux")]
        assert_eq!(platform, Platform::LinuxSystemd);
        #[cfg(target_os = "windows")]
        assert_eq!(platform, Platform::WindowsScm);
        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        assert_eq!(platform, Platform::Unsupported);
    }
}
