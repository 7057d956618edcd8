//! Implementation of the `kitsch check-config` command.

use crate::cli::CheckConfigArgs;
use crate::config::{Config, default_config_file};
use crate::error::{KitschError, Result};
use crate::logging;
use std::path::{Path, PathBuf};

/// Execute the `kitsch check-config` command.
///
/// Every warning is shown, not just the first, so a user checking their
/// file sees all of it.
pub fn cmd_check_config(args: CheckConfigArgs, config_path: Option<&Path>) -> Result<()> {
    logging::set_verbose(true);

    let file = config_to_check(args.file, config_path)?;
    println!("Checking config file: {}", file.display());
    check_file(&file)?;
    println!("OK");
    Ok(())
}

/// The positional argument wins, then `--config`, then the default file.
fn config_to_check(file: Option<PathBuf>, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file);
    }
    if let Some(path) = config_path {
        return Ok(path.to_path_buf());
    }
    default_config_file()
        .filter(|path| path.exists())
        .ok_or_else(|| KitschError::Config("no configuration file found".to_string()))
}

fn check_file(file: &Path) -> Result<()> {
    Config::load(file)?.validate()
}
