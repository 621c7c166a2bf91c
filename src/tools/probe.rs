//! Tool presence and version probing.

use std::path::{Path, PathBuf};

use log::debug;
use semver::Version;

use super::ToolRequirement;
use crate::runner::CommandRunner;

/// Presence check seam. The production probe resolves executables on
/// PATH; tests substitute a canned table.
pub trait ToolProbe {
    /// Absence is a normal result, never an error.
    fn resolve(&self, binary: &str) -> Option<PathBuf>;
}

/// PATH-based probe. Re-reads the live PATH on every call, so it
/// observes the extension performed after installs.
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn resolve(&self, binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }
}

/// True when the tool resolves on PATH and meets its minimum version,
/// if one is declared.
pub fn is_available(
    probe: &dyn ToolProbe,
    runner: &dyn CommandRunner,
    req: &ToolRequirement,
) -> bool {
    let Some(path) = probe.resolve(req.binary) else {
        return false;
    };
    match &req.min_version {
        None => true,
        Some(min) => match probe_version(runner, &path) {
            Some(found) => {
                if found < *min {
                    debug!("{} {} is older than required {}", req.name, found, min);
                }
                found >= *min
            }
            // A tool that hides its version is treated as present; the
            // build step surfaces real incompatibilities.
            None => true,
        },
    }
}

/// Run `<tool> --version` and parse the first dotted version in its
/// output, checking stderr when stdout is empty (some tools report
/// there).
pub fn probe_version(runner: &dyn CommandRunner, tool: &Path) -> Option<Version> {
    let out = runner.run(tool, &["--version"], None).ok()?;
    if !out.success {
        return None;
    }
    let text = if out.stdout.trim().is_empty() {
        out.stderr
    } else {
        out.stdout
    };
    parse_version(&text)
}

/// Extract a version from strings like `v18.19.1`, `git version 2.43.0`
/// or `cargo 1.75.0 (1d8b05cdd 2023-11-20)`.
pub fn parse_version(text: &str) -> Option<Version> {
    for token in text.split_whitespace() {
        let token = token.trim_start_matches('v');
        let numeric: String = token
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let mut parts = numeric.splitn(3, '.');
        let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
            continue;
        };
        let patch = parts.next().filter(|p| !p.is_empty()).unwrap_or("0");
        let (Ok(major), Ok(minor), Ok(patch)) =
            (major.parse::<u64>(), minor.parse::<u64>(), patch.parse::<u64>())
        else {
            continue;
        };
        return Some(Version::new(major, minor, patch));
    }
    None
}
