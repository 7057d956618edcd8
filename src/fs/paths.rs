//! Executable and ancestor lookups.

use std::env;
use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Walk from `folder` up to the filesystem root looking for `name`.
pub fn find_file_in_ancestors(folder: &Path, name: &str) -> Option<PathBuf> {
    folder
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(meta) => !meta.is_dir() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Resolve an executable on `PATH`.
///
/// Unlike a plain `PATH` walk this never resolves relative to the current
/// directory: empty and `.` entries are skipped, and a relative name that
/// contains a separator is rejected. A prompt runs in whatever directory the
/// user happens to `cd` into, including untrusted checkouts.
pub fn look_path_safe(file: &str) -> Option<PathBuf> {
    if file.contains(MAIN_SEPARATOR) || file.contains('/') {
        let path = Path::new(file);
        if path.is_absolute() && is_executable(path) {
            return Some(path.to_path_buf());
        }
        return None;
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty() && dir != Path::new("."))
        .filter(|dir| dir.is_absolute())
        .map(|dir| dir.join(file))
        .find(|candidate| is_executable(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_with_separator_are_rejected() {
        assert_eq!(look_path_safe("./git"), None);
        assert_eq!(look_path_safe("bin/git"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_finds_sh() {
        let sh = look_path_safe("sh").expect("sh should be on PATH");
        assert!(sh.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_executable_is_accepted() {
        assert_eq!(look_path_safe("/bin/sh"), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn test_missing_executable() {
        assert_eq!(look_path_safe("kitsch-no-such-binary-xyz"), None);
    }
}
