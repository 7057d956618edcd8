//! Read-only view of the current working directory.
//!
//! The directory listing is loaded once, on first use, and shared by every
//! module that asks about files or extensions. Listing a huge directory is
//! bounded by a scan timeout; whatever was read by then is used.

use super::paths::find_file_in_ancestors;
use globset::Glob;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Listing {
    files: HashSet<String>,
    extensions: HashSet<String>,
}

impl Listing {
    fn add(&mut self, filename: &str) {
        self.files.insert(filename.to_string());

        let parts: Vec<&str> = filename.split('.').collect();
        if parts[0].is_empty() {
            // dotfile
            return;
        }
        // "foo.rc.js" has both "rc.js" and "js" as extensions.
        for i in 1..parts.len() {
            let ext = parts[i..].join(".");
            if !ext.is_empty() {
                self.extensions.insert(ext);
            }
        }
    }
}

#[derive(Debug)]
pub struct Directory {
    path: PathBuf,
    scan_timeout: Duration,
    listing: OnceLock<Listing>,
    read_only: Option<bool>,
}

impl Directory {
    pub fn new(path: impl Into<PathBuf>, scan_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            scan_timeout,
            listing: OnceLock::new(),
            read_only: None,
        }
    }

    /// Report a fixed read-only state instead of asking the filesystem.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn listing(&self) -> &Listing {
        self.listing.get_or_init(|| {
            let mut listing = Listing::default();
            let Ok(entries) = fs::read_dir(&self.path) else {
                return listing;
            };

            let start = Instant::now();
            let mut count = 0usize;
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    listing.add(name);
                }
                count += 1;
                if !self.scan_timeout.is_zero() && start.elapsed() > self.scan_timeout {
                    tracing::debug!(
                        "directory scan of {} timed out after {} files",
                        self.path.display(),
                        count
                    );
                    break;
                }
            }
            listing
        })
    }

    /// Returns true if the directory contains a file with the given extension.
    /// A leading "." on `extension` is ignored.
    pub fn has_extension(&self, extension: &str) -> bool {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        if extension.is_empty() {
            return false;
        }
        self.listing().extensions.contains(extension)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.listing().files.contains(name)
    }

    /// Returns true if any entry in the directory matches the glob.
    pub fn has_glob(&self, pattern: &str) -> bool {
        let Ok(glob) = Glob::new(pattern) else {
            return false;
        };
        let matcher = glob.compile_matcher();
        self.listing().files.iter().any(|f| matcher.is_match(f))
    }

    /// Search this directory and its ancestors for `name`.
    pub fn find_file_in_ancestors(&self, name: &str) -> Option<PathBuf> {
        find_file_in_ancestors(&self.path, name)
    }

    /// True if the directory exists and is not writable by its owner.
    pub fn is_read_only(&self) -> bool {
        if let Some(read_only) = self.read_only {
            return read_only;
        }
        match fs::metadata(&self.path) {
            Ok(meta) => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    meta.permissions().mode() & 0o200 == 0
                }
                #[cfg(not(unix))]
                {
                    meta.permissions().readonly()
                }
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_with(files: &[&str]) -> (TempDir, Directory) {
        let temp = TempDir::new().unwrap();
        for f in files {
            fs::write(temp.path().join(f), "").unwrap();
        }
        let dir = Directory::new(temp.path(), Duration::from_millis(500));
        (temp, dir)
    }

    #[test]
    fn test_has_extension() {
        let (_temp, dir) = dir_with(&["main.go", "foo.rc.js", ".eslintrc"]);

        assert!(dir.has_extension("go"));
        assert!(dir.has_extension(".go"));
        assert!(dir.has_extension("js"));
        assert!(dir.has_extension("rc.js"));
        assert!(!dir.has_extension("eslintrc"));
        assert!(!dir.has_extension(""));
    }

    #[test]
    fn test_has_file_and_glob() {
        let (_temp, dir) = dir_with(&["Cargo.toml", "Chart.yaml"]);

        assert!(dir.has_file("Cargo.toml"));
        assert!(!dir.has_file("package.json"));
        assert!(dir.has_glob("*.toml"));
        assert!(dir.has_glob("Chart.*"));
        assert!(!dir.has_glob("*.json"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = Directory::new("/definitely/not/here", Duration::ZERO);
        assert!(!dir.has_file("anything"));
        assert!(!dir.is_read_only());
        assert!(dir.with_read_only(true).is_read_only());
    }

    #[test]
    fn test_find_file_in_ancestors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("marker"), "").unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let dir = Directory::new(&nested, Duration::ZERO);
        assert_eq!(
            dir.find_file_in_ancestors("marker"),
            Some(temp.path().join("marker"))
        );
    }
}
