//! The current working directory, shortened for display.

use super::{Module, ModuleResult};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_home_symbol() -> String {
    "~".to_string()
}

fn default_read_only_symbol() -> String {
    "🔒".to_string()
}

fn default_truncation_symbol() -> String {
    "…".to_string()
}

fn default_truncation_length() -> usize {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryModule {
    /// Replaces the home directory.
    #[serde(default = "default_home_symbol")]
    home_symbol: String,
    /// Appended when the directory is not writable.
    #[serde(default = "default_read_only_symbol")]
    read_only_symbol: String,
    /// Inside a git repository, show the path from the repository root.
    #[serde(default = "default_true")]
    truncate_to_repo: bool,
    /// Prefix for the repository name when truncating to the repository.
    #[serde(default)]
    repo_symbol: String,
    /// Most path components to show. Zero disables truncation.
    #[serde(default = "default_truncation_length")]
    truncation_length: usize,
    /// Stands in for the components that were dropped.
    #[serde(default = "default_truncation_symbol")]
    truncation_symbol: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DirectoryData {
    path: String,
    path_separator: String,
    read_only: bool,
    read_only_symbol: String,
}

/// True if `path` is `root` or inside it.
fn is_within(path: &str, root: &str, separator: &str) -> bool {
    if root.is_empty() {
        return false;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with(separator) || root.ends_with(separator),
        None => false,
    }
}

/// Remove `root` from the front of `path`. What's left is empty or starts
/// with a separator.
fn strip_root<'a>(path: &'a str, root: &str, separator: &str) -> &'a str {
    let len = match root.strip_suffix(separator) {
        Some(trimmed) => trimmed.len(),
        None => root.len(),
    };
    &path[len..]
}

/// `C:` from `C:\Users`, when paths use backslashes.
fn volume_name<'a>(path: &'a str, separator: &str) -> &'a str {
    let bytes = path.as_bytes();
    if separator == "\\" && bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &path[..2]
    } else {
        ""
    }
}

impl DirectoryModule {
    fn display_path(&self, context: &Context) -> String {
        let globals = &context.globals;
        let separator = globals.path_separator.as_str();
        let mut path = globals.logical_cwd().to_string();
        let mut prefix = String::new();
        let mut is_home = is_within(&path, &globals.home, separator);

        let repo_root = if self.truncate_to_repo {
            context
                .git()
                .map(|git| git.repo_root().to_string_lossy().into_owned())
        } else {
            None
        };

        match repo_root {
            Some(root) if is_within(&path, &root, separator) => {
                let repo_name = root
                    .trim_end_matches(separator)
                    .rsplit(separator)
                    .next()
                    .unwrap_or_default();
                prefix = format!("{}{}", self.repo_symbol, repo_name);
                path = strip_root(&path, &root, separator).to_string();
                is_home = false;
            }
            _ => {
                let volume = volume_name(&path, separator);
                if !volume.is_empty() && !is_home {
                    prefix = volume.to_string();
                    path = path[volume.len()..].to_string();
                }
            }
        }

        let mut truncation_length = self.truncation_length;
        if is_home {
            path = format!(
                "{}{}",
                self.home_symbol,
                strip_root(&path, &globals.home, separator)
            );
            // No sense in replacing "~" with the truncation symbol.
            truncation_length += 1;
        }

        if self.truncation_length > 0 {
            let parts: Vec<&str> = path.split(separator).collect();
            if parts.len() > truncation_length {
                let kept = parts[parts.len() - self.truncation_length..].join(separator);
                let leading = if prefix.is_empty() { "" } else { separator };
                path = format!("{}{}{}{}", leading, self.truncation_symbol, separator, kept);
            }
        }

        prefix + &path
    }
}

impl Module for DirectoryModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let path = self.display_path(context);
        let read_only = context.directory.is_read_only();

        let mut text = path.clone();
        if read_only {
            text.push_str(&self.read_only_symbol);
        }

        ModuleResult::with_data(
            text,
            &DirectoryData {
                path,
                path_separator: context.globals.path_separator.clone(),
                read_only,
                read_only_symbol: self.read_only_symbol.clone(),
            },
        )
    }
}
