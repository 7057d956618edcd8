//! Config loading, `extends` resolution, and validation.

use super::model::{Config, DEFAULT_CONFIG};
use crate::error::{KitschError, Result};
use crate::logging;
use crate::projects::{ProjectType, default_project_types, merge_project_types};
use crate::style::{ColorLevel, Registry};
use std::path::{Path, PathBuf};

/// Deepest chain of `extends` we follow.
const MAX_EXTENDS_DEPTH: usize = 10;

/// `<config dir>/kitsch/kitsch.yaml`.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kitsch").join("kitsch.yaml"))
}

/// Where getter output is cached.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kitsch")
}

/// Resolve `extends` against the directory of the file that names it.
fn resolve_extends(extends: &str, base_dir: Option<&Path>) -> PathBuf {
    if let Some(rest) = extends.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    let path = PathBuf::from(extends);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

impl Config {
    /// Load a configuration file, following `extends`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_nested(path.as_ref(), 0)
    }

    fn load_nested(path: &Path, depth: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KitschError::io(format!("failed to read config file '{}'", path.display()), e)
        })?;
        let config = Self::parse(&content, path.parent(), depth)?;
        if config.prompt.is_none() {
            return Err(KitschError::Config(format!(
                "configuration '{}' is missing prompt",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Parse a configuration from YAML. A relative `extends` is resolved
    /// against the current directory.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, None, 0)
    }

    fn parse(yaml: &str, base_dir: Option<&Path>, depth: usize) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| KitschError::Config(format!("failed to parse config YAML: {}", e)))?;

        if !config.extends.is_empty() {
            let parent_path = resolve_extends(&config.extends, base_dir);
            if depth + 1 >= MAX_EXTENDS_DEPTH {
                return Err(KitschError::ExtendsTooDeep(
                    parent_path.display().to_string(),
                ));
            }
            match Self::load_nested(&parent_path, depth + 1) {
                Ok(parent) => config.merge_parent(parent)?,
                Err(err @ KitschError::ExtendsTooDeep(_)) => return Err(err),
                Err(err) => logging::warn(format!(
                    "unable to load parent configuration '{}': {}",
                    parent_path.display(),
                    err
                )),
            }
        }

        Ok(config)
    }

    /// The built-in configuration.
    pub fn load_default() -> Result<Self> {
        Self::from_yaml(DEFAULT_CONFIG)
    }

    /// The configuration to render with: `explicit` if given, else the user's
    /// configuration file if it exists, else the built-in default.
    pub fn find(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_file() {
            Some(path) if path.exists() => Self::load(path),
            _ => Self::load_default(),
        }
    }

    /// Configured project types followed by the built-in ones.
    pub fn all_project_types(&self) -> Result<Vec<ProjectType>> {
        merge_project_types(self.project_types.clone(), &default_project_types())
    }

    /// A style registry that knows this configuration's custom colours.
    pub fn styles(&self, level: ColorLevel) -> Registry {
        let mut styles = Registry::new(level);
        styles.add_custom_colors(&self.colors);
        styles
    }

    /// Check everything that can be checked without rendering: the prompt
    /// exists, colours are well named, timeouts are positive, project types
    /// are complete, and every module's styles and templates compile.
    ///
    /// All problems are reported together.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let mut names: Vec<&String> = self.colors.keys().collect();
        names.sort();
        for name in names {
            if !name.starts_with('$') {
                errors.push(format!("colors: \"{}\" must start with '$'", name));
            }
        }
        if self.timeout == Some(0) {
            errors.push("timeout must be greater than 0".to_string());
        }
        if self.scan_timeout == Some(0) {
            errors.push("scanTimeout must be greater than 0".to_string());
        }
        if let Err(err) = self.all_project_types() {
            errors.push(err.to_string());
        }
        for project_type in &self.project_types {
            if let Err(err) = project_type.validate() {
                errors.push(err.to_string());
            }
        }

        match &self.prompt {
            Some(prompt) => prompt.validate(&self.styles(ColorLevel::TrueColor), &mut errors),
            None => errors.push("configuration is missing prompt".to_string()),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(KitschError::Config(format!(
                "config validation failed:\n  {}",
                errors.join("\n  ")
            )))
        }
    }
}
