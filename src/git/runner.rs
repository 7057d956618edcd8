//! Git command runner.
//!
//! Every git subprocess goes through here so failures are reported the same
//! way. Commands are run from the repository root.

use crate::error::{KitschError, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Output of a successful git command.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Raw standard output. `status -z` output is NUL-separated and must not
    /// be trimmed, so this is kept as bytes.
    pub stdout: Vec<u8>,
    /// Standard error (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: output.stdout.clone(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Standard output as trimmed text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

}

fn command(git: &Path, cwd: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(git);
    cmd.current_dir(cwd)
        .args(args)
        // Never block on a credential or editor prompt.
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_OPTIONAL_LOCKS", "0")
        .stdin(Stdio::null());
    cmd
}

fn failure(args: &[&str], code: Option<i32>, stderr: &str) -> KitschError {
    KitschError::Git(format!(
        "git {} failed (exit code {}): {}",
        args.first().unwrap_or(&""),
        code.unwrap_or(-1),
        stderr
    ))
}

/// Run `git <args>` in `cwd` and capture its output.
///
/// A non-zero exit is an error carrying stderr (or stdout, if stderr is
/// empty).
pub fn run_git(git: &Path, cwd: &Path, args: &[&str]) -> Result<GitOutput> {
    let output = command(git, cwd, args).output().map_err(|e| {
        KitschError::Git(format!(
            "failed to execute git {}: {}",
            args.first().unwrap_or(&""),
            e
        ))
    })?;

    let git_output = GitOutput::from_output(&output);
    if output.status.success() {
        Ok(git_output)
    } else {
        let message = if git_output.stderr.is_empty() {
            git_output.text()
        } else {
            git_output.stderr.clone()
        };
        Err(failure(args, output.status.code(), &message))
    }
}

/// Run `git <args>` in `cwd`, streaming standard output into `sink` as it
/// is produced instead of buffering it.
pub fn stream_git<W: Write>(git: &Path, cwd: &Path, args: &[&str], sink: &mut W) -> Result<()> {
    let mut child = command(git, cwd, args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            KitschError::Git(format!(
                "failed to execute git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    if let Some(mut stdout) = child.stdout.take() {
        std::io::copy(&mut stdout, sink)
            .map_err(|e| KitschError::io("failed to read git output", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| KitschError::io("failed to wait for git", e))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(failure(args, output.status.code(), &stderr))
    }
}
