//! Command implementations for kitsch.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod cache_clear;
mod check_config;
mod init;
mod prompt;
mod style_cmd;

use crate::cli::{Cli, Command};
use crate::error::Result;
use crate::logging;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Logging is set up
/// here so every command gets the same stderr output.
pub fn dispatch(cli: Cli) -> Result<()> {
    logging::init(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Command::Prompt(args) => prompt::cmd_prompt(args, config),
        Command::CheckConfig(args) => check_config::cmd_check_config(args, config),
        Command::Style(args) => style_cmd::cmd_style(args, config),
        Command::CacheClear => cache_clear::cmd_cache_clear(),
        Command::Init(args) => init::cmd_init(&args.shell, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use clap::Parser;

    #[test]
    fn dispatch_routes_init() {
        let cli = Cli::try_parse_from(["kitsch", "init", "tcsh"]).unwrap();
        let err = dispatch(cli).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("tcsh"));
    }

    #[test]
    fn dispatch_routes_check_config() {
        let cli =
            Cli::try_parse_from(["kitsch", "check-config", "/nonexistent/kitsch.yaml"]).unwrap();
        let err = dispatch(cli).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::RUNTIME_FAILURE);
    }
}
