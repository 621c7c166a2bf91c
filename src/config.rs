//! Tool configuration.
//!
//! Read from `<config_dir>/wgbootstrap/wgbootstrap.toml`, auto-generated
//! with defaults on first run. Missing fields fall back to the same
//! defaults, so a generated file and an empty file behave identically.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    #[serde(default = "default_repository_url")]
    pub repository_url: String,
    /// Base directory the repository is cloned under. Empty selects the
    /// platform data directory; relative values resolve against home.
    #[serde(default)]
    pub install_base: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_description")]
    pub service_description: String,
    /// Argv of the project's run step, executed from the project
    /// directory by the generated start script.
    #[serde(default = "default_run_step")]
    pub run_step: Vec<String>,
    /// Seconds the supervisor waits before restarting a failed service.
    #[serde(default = "default_restart_sec")]
    pub restart_sec: u32,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            repository_url: default_repository_url(),
            install_base: String::new(),
            service_name: default_service_name(),
            service_description: default_service_description(),
            run_step: default_run_step(),
            restart_sec: default_restart_sec(),
        }
    }
}

fn default_repository_url() -> String {
    "https://github.com/wg-backend/wg-backend.git".to_string()
}

fn default_service_name() -> String {
    "wg-backend".to_string()
}

fn default_service_description() -> String {
    "WireGuard configuration backend".to_string()
}

fn default_run_step() -> Vec<String> {
    vec!["cargo".into(), "run".into(), "--release".into()]
}

fn default_restart_sec() -> u32 {
    5
}

/// Absolute locations for one provisioning run. Computed once at startup;
/// nothing downstream depends on the ambient working directory.
#[derive(Debug, Clone)]
pub struct ProjectLocation {
    pub repository_url: String,
    pub install_base: PathBuf,
    pub project_dir: PathBuf,
}

impl ProvisionConfig {
    pub fn resolve_location(&self) -> Result<ProjectLocation> {
        let install_base = if self.install_base.is_empty() {
            dirs::data_local_dir()
                .context("could not determine the platform data directory")?
                .join("wgbootstrap")
        } else {
            let configured = PathBuf::from(&self.install_base);
            if configured.is_absolute() {
                configured
            } else {
                dirs::home_dir()
                    .context("could not determine the home directory")?
                    .join(configured)
            }
        };

        let name = repo_dir_name(&self.repository_url).with_context(|| {
            format!("cannot derive a directory name from `{}`", self.repository_url)
        })?;

        Ok(ProjectLocation {
            repository_url: self.repository_url.clone(),
            project_dir: install_base.join(name),
            install_base,
        })
    }
}

/// Last path segment of a repository URL, without any `.git` suffix.
/// Handles both `https://host/org/name.git` and `git@host:org/name`.
fn repo_dir_name(url: &str) -> Option<&str> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then_some(name)
}

/// Default config file location.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("could not determine the config directory")?
        .join("wgbootstrap")
        .join("wgbootstrap.toml"))
}

/// Load the config file, generating it with defaults when absent.
pub fn load_or_init(explicit: Option<&str>) -> Result<ProvisionConfig> {
    let path = match explicit {
        Some(p) => PathBuf::from(p),
        None => config_file_path()?,
    };

    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let default_toml = toml::to_string_pretty(&ProvisionConfig::default())
            .context("failed to serialize default config")?;
        fs::write(&path, default_toml)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("created default configuration at {}", path.display());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: ProvisionConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn repo_dir_name_strips_git_suffix() {
        assert_eq!(
            repo_dir_name("https://github.com/wg-backend/wg-backend.git"),
            Some("wg-backend")
        );
    }

    #[test]
    fn repo_dir_name_handles_scp_style_urls() {
        assert_eq!(
            repo_dir_name("git@github.com:wg-backend/wg-backend"),
            Some("wg-backend")
        );
    }

    #[test]
    fn repo_dir_name_rejects_empty() {
        assert_eq!(repo_dir_name(""), None);
        assert_eq!(repo_dir_name("///"), None);
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let parsed: ProvisionConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, ProvisionConfig::default());
    }

    #[test]
    fn resolved_paths_are_absolute() {
        let location = ProvisionConfig::default().resolve_location().unwrap();
        assert!(location.install_base.is_absolute());
        assert!(location.project_dir.is_absolute());
        assert!(location.project_dir.ends_with("wg-backend"));
    }

    #[test]
    fn load_or_init_generates_then_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wgbootstrap.toml");
        let generated = load_or_init(path.to_str()).unwrap();
        assert!(path.exists());
        let reread = load_or_init(path.to_str()).unwrap();
        assert_eq!(generated, reread);
    }
}
