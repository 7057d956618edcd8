//! Implementation of the `kitsch init` command.
//!
//! Prints a script that, when evaluated by the shell, installs kitsch as
//! the prompt. The script calls back into this executable with whatever the
//! shell knows about the last command: exit status, duration, background
//! jobs, and the vi keymap.

use crate::error::{KitschError, Result};
use std::path::Path;

/// Shells `init` knows how to set up.
pub const SUPPORTED_SHELLS: &[&str] = &["bash", "zsh", "fish"];

const COMMAND_PLACEHOLDER: &str = "__KITSCH_COMMAND__";

fn template(shell: &str) -> Option<&'static str> {
    match shell {
        "bash" => Some(include_str!("kitsch.bash")),
        "zsh" => Some(include_str!("kitsch.zsh")),
        "fish" => Some(include_str!("kitsch.fish")),
        _ => None,
    }
}

/// The command the script runs: this executable, plus `--config` if one was
/// given, quoted for the shell.
fn kitsch_command(exe: &str, config: Option<&Path>) -> String {
    let mut command = shell_words::quote(exe).into_owned();
    if let Some(config) = config {
        command.push_str(" --config ");
        command.push_str(&shell_words::quote(&config.to_string_lossy()));
    }
    command
}

/// The init script for `shell`.
pub fn init_script(shell: &str, exe: &str, config: Option<&Path>) -> Result<String> {
    let template = template(shell).ok_or_else(|| KitschError::UnknownShell(shell.to_string()))?;
    Ok(template.replace(COMMAND_PLACEHOLDER, &kitsch_command(exe, config)))
}

/// Execute the `kitsch init` command.
pub fn cmd_init(shell: &str, config: Option<&Path>) -> Result<()> {
    let exe = std::env::current_exe()
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "kitsch".to_string());

    let script = init_script(shell, &exe, config).map_err(|err| match err {
        KitschError::UnknownShell(shell) => KitschError::UnknownShell(format!(
            "{}; use one of: {}",
            shell,
            SUPPORTED_SHELLS.join(", ")
        )),
        other => other,
    })?;
    print!("{}", script);
    Ok(())
}

#[cfg(test)]
mod tests;
