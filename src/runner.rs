//! External command execution seam.
//!
//! Everything wgbootstrap runs externally (`git`, `npm`, `cargo`,
//! package managers, `systemctl`, `sc`) goes through [`CommandRunner`]
//! so the provisioning flow can be exercised with a recording fake.

use std::path::Path;
use std::process::Command;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// Exit code with `-1` standing in for signal termination.
    pub fn code(&self) -> i32 {
        self.status_code.unwrap_or(-1)
    }
}

pub trait CommandRunner {
    /// Run `program` with `args`, optionally in `cwd`, capturing output.
    /// An `io::Error` means the program could not be spawned at all;
    /// a non-zero exit is reported through [`RunOutput`], not as an error.
    fn run(&self, program: &Path, args: &[&str], cwd: Option<&Path>)
    -> std::io::Result<RunOutput>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &Path,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> std::io::Result<RunOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;
        Ok(RunOutput {
            status_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_stdout_and_exit() {
        let out = SystemRunner
            .run(Path::new("sh"), &["-c", "echo hello"], None)
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_nonzero_exit_without_error() {
        let out = SystemRunner
            .run(Path::new("sh"), &["-c", "exit 3"], None)
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code(), 3);
    }

    #[test]
    fn spawn_failure_is_an_io_error() {
        let result = SystemRunner.run(Path::new("/nonexistent/wgbootstrap-tool"), &[], None);
        assert!(result.is_err());
    }
}
