//! npm version lookup.
//!
//! `npm --version` takes about half a second, so instead follow the `npm`
//! symlink to its install and read the version from npm's own
//! `package.json`, falling back to running npm only if that fails.

use crate::context::Context;
use crate::error::{KitschError, Result};
use crate::fs::look_path_safe;
use crate::getters::run_command;
use std::fs;
use std::path::{Path, PathBuf};

fn npm_package_json(npm: &Path) -> Option<PathBuf> {
    if cfg!(windows) {
        return Some(npm.parent()?.join("node_modules").join("npm").join("package.json"));
    }
    let resolved = fs::canonicalize(npm).ok()?;
    let bin = resolved.parent()?;
    bin.ends_with("node_modules/npm/bin")
        .then(|| bin.parent().map(|dir| dir.join("package.json")))
        .flatten()
}

fn read_version(package_json: &Path) -> Result<String> {
    let contents = fs::read(package_json)
        .map_err(|e| KitschError::io(format!("failed to read {}", package_json.display()), e))?;
    let parsed: serde_json::Value = serde_json::from_slice(&contents)
        .map_err(|e| KitschError::Getter(format!("invalid {}: {}", package_json.display(), e)))?;
    parsed
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            KitschError::Getter(format!("{} has no version", package_json.display()))
        })
}

pub fn npm_version(context: &Context) -> Result<String> {
    let npm = look_path_safe("npm")
        .ok_or_else(|| KitschError::Getter("could not find npm".to_string()))?;

    if let Some(package_json) = npm_package_json(&npm)
        && let Ok(version) = read_version(&package_json)
    {
        return Ok(version);
    }

    let output = run_command(&npm, &["--version".to_string()], context.directory.path())?;
    Ok(String::from_utf8_lossy(&output).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        fs::write(&path, r#"{"name": "npm", "version": "8.1.0"}"#).unwrap();
        assert_eq!(read_version(&path).unwrap(), "8.1.0");

        fs::write(&path, r#"{"name": "npm"}"#).unwrap();
        assert!(read_version(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_package_json_next_to_npm_install() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("lib/node_modules/npm/bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("npm-cli.js"), "").unwrap();
        let link = temp.path().join("npm");
        std::os::unix::fs::symlink(bin.join("npm-cli.js"), &link).unwrap();

        let expected = fs::canonicalize(temp.path().join("lib/node_modules/npm/package.json").parent().unwrap())
            .unwrap()
            .join("package.json");
        assert_eq!(npm_package_json(&link), Some(expected));
    }
}
