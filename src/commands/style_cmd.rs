//! Implementation of the `kitsch style` command.

use crate::cli::StyleArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging;
use crate::style::{ColorLevel, Registry};
use std::path::Path;

/// Execute the `kitsch style` command.
///
/// Custom colours from the configuration are available when it loads. A
/// configuration that fails to load only costs those colours.
pub fn cmd_style(args: StyleArgs, config_path: Option<&Path>) -> Result<()> {
    let level = ColorLevel::detect(|name| std::env::var(name).ok());
    let styles = match Config::find(config_path) {
        Ok(config) => config.styles(level),
        Err(err) => {
            logging::warn(format!("could not load configuration: {}", err));
            Registry::new(level)
        }
    };

    println!("{}", apply(&styles, &args.descriptor, &args.text)?);
    Ok(())
}

fn apply(styles: &Registry, descriptor: &str, text: &str) -> Result<String> {
    let style = styles.get(descriptor)?;
    Ok(style.apply(text))
}
