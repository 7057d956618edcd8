//! Kitsch: a fast, ridiculously customizable shell prompt.
//!
//! This is the main entry point for the `kitsch` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cache;
mod cli;
mod commands;
mod condition;
mod config;
mod context;
mod env;
mod error;
mod exit_codes;
mod fs;
mod getters;
mod git;
mod logging;
mod modules;
mod perf;
mod projects;
mod render;
mod style;
mod template;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
