//! CLI argument parsing for kitsch.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kitsch: a fast, ridiculously customizable shell prompt.
///
/// Add `eval "$(kitsch init bash)"` (or zsh, or fish) to your shell's
/// startup file to use it.
#[derive(Parser, Debug)]
#[command(name = "kitsch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: <config dir>/kitsch/kitsch.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show every warning and debug output.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for kitsch.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the prompt.
    ///
    /// Normally run by the shell integration from `kitsch init`, which
    /// passes along the exit status, duration and so on of the last command.
    Prompt(PromptArgs),

    /// Check a configuration file for errors.
    ///
    /// Checks the given file, or the `--config` file, or the default
    /// configuration file.
    CheckConfig(CheckConfigArgs),

    /// Print text in a style, to try out style strings.
    Style(StyleArgs),

    /// Remove cached command output.
    CacheClear,

    /// Print the script that hooks kitsch into a shell.
    Init(InitArgs),
}

/// Arguments for the `prompt` command.
#[derive(Parser, Debug, Default)]
pub struct PromptArgs {
    /// The type of shell (bash, zsh, fish).
    #[arg(long, default_value = "")]
    pub shell: String,

    /// The current working directory.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// The working directory as the user sees it, e.g. through a symlink.
    #[arg(long)]
    pub logical_path: Option<String>,

    /// How long the previous command took, in milliseconds.
    #[arg(short = 'd', long, default_value_t = 0)]
    pub cmd_duration: i64,

    /// The zsh/fish keymap (`vicmd` in vi normal mode).
    #[arg(short, long, default_value = "")]
    pub keymap: String,

    /// Number of background jobs.
    #[arg(short, long, default_value_t = 0)]
    pub jobs: i64,

    /// Exit status of the previous command.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub status: i64,

    /// Width of the terminal, in columns.
    #[arg(long)]
    pub terminal_width: Option<usize>,

    /// Print how long each module took to stderr.
    #[arg(long)]
    pub perf: bool,

    /// Render from the facts in this YAML file instead of the real system.
    #[arg(long)]
    pub demo: Option<PathBuf>,
}

/// Arguments for the `check-config` command.
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Configuration file to check.
    pub file: Option<PathBuf>,
}

/// Arguments for the `style` command.
#[derive(Parser, Debug)]
pub struct StyleArgs {
    /// Style string, e.g. "bold linear-gradient(#f00, #00f)".
    pub descriptor: String,

    /// Text to style.
    pub text: String,
}

/// Arguments for the `init` command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// The shell to initialize: bash, zsh, or fish.
    pub shell: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
