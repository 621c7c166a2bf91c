//! Dependency install and release build.
//!
//! Two steps, both scoped to the project directory: `npm install` for
//! the web UI dependencies, then `cargo build --release`. Any non-zero
//! exit aborts the provisioning sequence.

use std::path::Path;

use log::debug;

use crate::error::ProvisionError;
use crate::runner::CommandRunner;

pub fn build(
    runner: &dyn CommandRunner,
    npm: &Path,
    cargo: &Path,
    project_dir: &Path,
) -> Result<(), ProvisionError> {
    run_step(runner, npm, &["install"], project_dir, "npm install")?;
    run_step(
        runner,
        cargo,
        &["build", "--release"],
        project_dir,
        "cargo build",
    )
}

fn run_step(
    runner: &dyn CommandRunner,
    program: &Path,
    args: &[&str],
    dir: &Path,
    step: &'static str,
) -> Result<(), ProvisionError> {
    debug!("running {step} in {}", dir.display());
    let out = runner
        .run(program, args, Some(dir))
        .map_err(|e| ProvisionError::BuildFailure {
            step,
            code: -1,
            dir: dir.to_path_buf(),
            stderr: format!("could not invoke {}: {e}", program.display()),
        })?;
    if !out.success {
        return Err(ProvisionError::BuildFailure {
            step,
            code: out.code(),
            dir: dir.to_path_buf(),
            stderr: out.stderr.trim().to_string(),
        });
    }
    Ok(())
}
