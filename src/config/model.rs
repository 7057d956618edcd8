//! Config struct definition and defaults.

use crate::context::{DEFAULT_SCAN_TIMEOUT, DEFAULT_TIMEOUT};
use crate::modules::ModuleWrapper;
use crate::projects::ProjectType;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// The configuration used when the user has none of their own.
pub const DEFAULT_CONFIG: &str = include_str!("default.yaml");

/// A kitsch configuration file.
///
/// Settings that are left out are inherited from the `extends` parent, if
/// any, and otherwise take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Path of a configuration to inherit from. Relative paths are resolved
    /// against the directory of the file that names them.
    pub extends: String,

    /// Custom colours, referenced from styles as `$name`.
    pub colors: HashMap<String, String>,

    /// Project types, tried before the built-in ones.
    pub project_types: Vec<ProjectType>,

    /// Default per-module timeout, in milliseconds.
    pub timeout: Option<u64>,

    /// Bound on listing the working directory, in milliseconds.
    pub scan_timeout: Option<u64>,

    /// What a flexible space becomes when the line is already full.
    pub flexible_space_replacement: Option<String>,

    /// The root module.
    pub prompt: Option<ModuleWrapper>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SCAN_TIMEOUT)
    }

    pub fn flexible_space_replacement(&self) -> &str {
        self.flexible_space_replacement.as_deref().unwrap_or(" ")
    }

    /// Take anything this configuration leaves unset from `parent`.
    pub(super) fn merge_parent(&mut self, parent: Config) -> crate::error::Result<()> {
        if self.prompt.is_none() {
            self.prompt = parent.prompt;
        }
        for (name, color) in parent.colors {
            self.colors.entry(name).or_insert(color);
        }
        self.project_types = crate::projects::merge_project_types(
            std::mem::take(&mut self.project_types),
            &parent.project_types,
        )?;
        self.timeout = self.timeout.or(parent.timeout);
        self.scan_timeout = self.scan_timeout.or(parent.scan_timeout);
        if self.flexible_space_replacement.is_none() {
            self.flexible_space_replacement = parent.flexible_space_replacement;
        }
        Ok(())
    }
}
