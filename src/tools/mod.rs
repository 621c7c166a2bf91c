//! Required-toolchain model.
//!
//! `wg-backend` needs a version-control client (git), a JavaScript
//! runtime (node/npm, for the web UI build) and the Rust toolchain
//! (cargo). Each requirement is immutable for the whole run and carries
//! its platform install strategy.

pub mod install;
pub mod probe;

use semver::Version;

use crate::platform::Platform;

/// How a missing tool gets installed on one platform.
#[derive(Debug, Clone)]
pub enum InstallStrategy {
    /// Platform package manager invocation.
    PackageManager {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// Vendor bootstrap script piped through the shell over HTTPS.
    VendorScript { shell_command: &'static str },
    /// No installer path on this platform; provisioning must abort.
    None,
}

/// One required external tool.
#[derive(Debug, Clone)]
pub struct ToolRequirement {
    pub name: &'static str,
    /// Executable probed for on PATH. Differs from `name` where the
    /// package and the binary are named differently.
    pub binary: &'static str,
    pub min_version: Option<Version>,
    pub strategy: InstallStrategy,
}

/// Outcome of [`install::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Installed,
    AlreadyPresent,
}

/// The toolchain wg-backend needs, in install order.
pub fn required_tools(platform: Platform) -> Vec<ToolRequirement> {
    match platform {
        Platform::LinuxSystemd => vec![
            ToolRequirement {
                name: "git",
                binary: "git",
                min_version: None,
                strategy: InstallStrategy::PackageManager {
                    program: "apt-get",
                    args: &["install", "-y", "git"],
                },
            },
            ToolRequirement {
                name: "node",
                binary: "node",
                min_version: Some(Version::new(18, 0, 0)),
                strategy: InstallStrategy::PackageManager {
                    program: "apt-get",
                    args: &["install", "-y", "nodejs", "npm"],
                },
            },
            ToolRequirement {
                name: "cargo",
                binary: "cargo",
                min_version: None,
                strategy: InstallStrategy::VendorScript {
                    shell_command: "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs \
                                    | sh -s -- -y --default-toolchain stable",
                },
            },
        ],
        Platform::WindowsScm => vec![
            ToolRequirement {
                name: "git",
                binary: "git",
                min_version: None,
                strategy: InstallStrategy::PackageManager {
                    program: "winget",
                    args: &[
                        "install",
                        "--id",
                        "Git.Git",
                        "-e",
                        "--accept-package-agreements",
                        "--accept-source-agreements",
                    ],
                },
            },
            ToolRequirement {
                name: "node",
                binary: "node",
                min_version: Some(Version::new(18, 0, 0)),
                strategy: InstallStrategy::PackageManager {
                    program: "winget",
                    args: &[
                        "install",
                        "--id",
                        "OpenJS.NodeJS.LTS",
                        "-e",
                        "--accept-package-agreements",
                        "--accept-source-agreements",
                    ],
                },
            },
            ToolRequirement {
                name: "cargo",
                binary: "cargo",
                min_version: None,
                strategy: InstallStrategy::PackageManager {
                    program: "winget",
                    args: &[
                        "install",
                        "--id",
                        "Rustlang.Rustup",
                        "-e",
                        "--accept-package-agreements",
                        "--accept-source-agreements",
                    ],
                },
            },
        ],
        Platform::Unsupported => vec![
            ToolRequirement {
                name: "git",
                binary: "git",
                min_version: None,
                strategy: InstallStrategy::None,
            },
            ToolRequirement {
                name: "node",
                binary: "node",
                min_version: Some(Version::new(18, 0, 0)),
                strategy: InstallStrategy::None,
            },
            ToolRequirement {
                name: "cargo",
                binary: "cargo",
                min_version: None,
                strategy: InstallStrategy::None,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_requires_the_same_tools() {
        for platform in [
            Platform::LinuxSystemd,
            Platform::WindowsScm,
            Platform::Unsupported,
        ] {
            let names: Vec<_> = required_tools(platform).iter().map(|t| t.name).collect();
            assert_eq!(names, ["git", "node", "cargo"]);
        }
    }

    #[test]
    fn unsupported_platform_has_no_install_strategy() {
        for tool in required_tools(Platform::Unsupported) {
            assert!(matches!(tool.strategy, InstallStrategy::None));
        }
    }
}
