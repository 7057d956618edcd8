//! Conditions that decide whether a module or project type applies to the
//! current directory.

use crate::fs::Directory;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conditions {
    /// Files to look for in the current directory or any ancestor.
    pub if_ancestor_files: Vec<String>,
    /// Files to look for in the current directory. Entries with glob
    /// characters match against the directory listing.
    pub if_files: Vec<String>,
    /// Extensions to look for in the current directory.
    pub if_extensions: Vec<String>,
    /// If set, the current OS must be in this list.
    #[serde(rename = "onlyIfOS")]
    pub only_if_os: Vec<String>,
    /// If set, the current OS must not be in this list.
    #[serde(rename = "onlyIfNotOS")]
    pub only_if_not_os: Vec<String>,
}

/// Names the current OS answers to. Rust says "macos" where configuration
/// files written for other tools say "darwin"; accept both.
fn os_names() -> &'static [&'static str] {
    match std::env::consts::OS {
        "macos" => &["macos", "darwin"],
        "linux" => &["linux"],
        "windows" => &["windows"],
        "freebsd" => &["freebsd"],
        "openbsd" => &["openbsd"],
        "netbsd" => &["netbsd"],
        _ => &[],
    }
}

fn is_current_os(list: &[String]) -> bool {
    list.iter().any(|os| {
        os == std::env::consts::OS || os_names().contains(&os.as_str())
    })
}

impl Conditions {
    pub fn is_empty(&self) -> bool {
        self.if_ancestor_files.is_empty()
            && self.if_files.is_empty()
            && self.if_extensions.is_empty()
            && self.only_if_os.is_empty()
            && self.only_if_not_os.is_empty()
    }

    fn has_file_conditions(&self) -> bool {
        !self.if_ancestor_files.is_empty()
            || !self.if_files.is_empty()
            || !self.if_extensions.is_empty()
    }

    fn matches_os(&self) -> bool {
        if !self.only_if_not_os.is_empty() && is_current_os(&self.only_if_not_os) {
            return false;
        }
        self.only_if_os.is_empty() || is_current_os(&self.only_if_os)
    }

    /// True if the OS filters pass and, when any file conditions are set,
    /// at least one of them matches in `directory`.
    pub fn matches(&self, directory: &Directory) -> bool {
        if !self.matches_os() {
            return false;
        }
        if !self.has_file_conditions() {
            return true;
        }

        if self
            .if_extensions
            .iter()
            .any(|ext| directory.has_extension(ext))
        {
            return true;
        }

        let has_file = |file: &String| {
            if Path::new(file).is_absolute() || file.starts_with("..") {
                // Not in the directory listing; ask the OS.
                directory.path().join(file).exists()
            } else if file.contains(['*', '?', '[', '{']) {
                directory.has_glob(file)
            } else {
                directory.has_file(file)
            }
        };
        if self.if_files.iter().any(has_file) {
            return true;
        }

        self.if_ancestor_files
            .iter()
            .any(|file| directory.find_file_in_ancestors(file).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> (TempDir, Directory) {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("project");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("go.work"), "").unwrap();
        for f in files {
            fs::write(nested.join(f), "").unwrap();
        }
        let dir = Directory::new(nested, Duration::ZERO);
        (temp, dir)
    }

    fn parse(yaml: &str) -> Conditions {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_empty() {
        let (_temp, dir) = project(&[]);
        let conditions = Conditions::default();
        assert!(conditions.is_empty());
        assert!(conditions.matches(&dir));
    }

    #[test]
    fn test_if_files_and_extensions() {
        let (_temp, dir) = project(&["package.json", "index.ts"]);

        assert!(parse("ifFiles: [package.json]").matches(&dir));
        assert!(!parse("ifFiles: [Cargo.toml]").matches(&dir));
        assert!(parse("ifExtensions: [ts]").matches(&dir));
        assert!(parse("ifFiles: [Cargo.toml]\nifExtensions: [ts]").matches(&dir));
        assert!(!parse("ifExtensions: [rs]").matches(&dir));
    }

    #[test]
    fn test_if_files_globs() {
        let (_temp, dir) = project(&["values.yaml", "main.tf"]);
        assert!(parse("ifFiles: ['*.tf']").matches(&dir));
        assert!(parse("ifFiles: ['values.{yml,yaml}']").matches(&dir));
        assert!(!parse("ifFiles: ['*.rs']").matches(&dir));
    }

    #[test]
    fn test_parent_relative_files() {
        let (_temp, dir) = project(&[]);
        assert!(parse("ifFiles: [../go.work]").matches(&dir));
        assert!(!parse("ifFiles: [go.work]").matches(&dir));
    }

    #[test]
    fn test_if_ancestor_files() {
        let (_temp, dir) = project(&[]);
        assert!(parse("ifAncestorFiles: [go.work]").matches(&dir));
        assert!(!parse("ifAncestorFiles: [nope.txt]").matches(&dir));
    }

    #[test]
    fn test_os_filters() {
        let (_temp, dir) = project(&["package.json"]);
        let here = std::env::consts::OS;

        let only_here = Conditions {
            only_if_os: vec![here.to_string()],
            ..Conditions::default()
        };
        assert!(only_here.matches(&dir));

        let not_here = Conditions {
            only_if_not_os: vec![here.to_string()],
            if_files: vec!["package.json".to_string()],
            ..Conditions::default()
        };
        assert!(!not_here.matches(&dir));

        assert!(!parse("onlyIfOS: [plan9]").matches(&dir));
        assert!(parse("onlyIfNotOS: [plan9]\nifFiles: [package.json]").matches(&dir));
    }
}
