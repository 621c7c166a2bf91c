//! Start-script emission.
//!
//! Service managers launch processes with a minimal inherited
//! environment, so the script carries everything the run step needs: an
//! explicit PATH including the user-local toolchain bin directories, the
//! absolute project directory, and the run-step argv.

use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::fsutil;
use crate::platform::Platform;

/// Write the start script into the project directory and return its
/// path. Overwrite, never append; identical inputs yield byte-identical
/// content.
pub fn write_start_script(
    platform: Platform,
    project_dir: &Path,
    path_dirs: &[PathBuf],
    run_step: &[String],
) -> Result<PathBuf, ProvisionError> {
    let (name, content) = match platform {
        Platform::WindowsScm => ("start.bat", batch_content(project_dir, path_dirs, run_step)),
        _ => ("start.sh", shell_content(project_dir, path_dirs, run_step)),
    };
    let script_path = project_dir.join(name);
    fsutil::write_file_atomic(&script_path, &content)?;
    fsutil::set_executable(&script_path)?;
    Ok(script_path)
}

fn shell_content(project_dir: &Path, path_dirs: &[PathBuf], run_step: &[String]) -> String {
    let mut content = String::with_capacity(512);
    content.push_str("#!/bin/sh\n");
    content.push_str("# Generated by wgbootstrap; rewritten on every provisioning run.\n");
    if !path_dirs.is_empty() {
        let joined = path_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        content.push_str(&format!("PATH=\"{joined}:${{PATH}}\"\n"));
        content.push_str("export PATH\n");
    }
    content.push_str(&format!("cd \"{}\" || exit 1\n", project_dir.display()));
    content.push_str("exec");
    for arg in run_step {
        content.push_str(&format!(" \"{arg}\""));
    }
    content.push('\n');
    content
}

fn batch_content(project_dir: &Path, path_dirs: &[PathBuf], run_step: &[String]) -> String {
    let mut content = String::with_capacity(512);
    content.push_str("@echo off\r\n");
    content.push_str("rem Generated by wgbootstrap; rewritten on every provisioning run.\r\n");
    if !path_dirs.is_empty() {
        let joined = path_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(";");
        content.push_str(&format!("set \"PATH={joined};%PATH%\"\r\n"));
    }
    content.push_str(&format!("cd /d \"{}\"\r\n", project_dir.display()));
    content.push_str(&run_step.join(" "));
    content.push_str("\r\n");
    content
}
