//! Implementation of the `kitsch cache-clear` command.

use crate::config::default_cache_dir;
use crate::error::{KitschError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Execute the `kitsch cache-clear` command.
pub fn cmd_cache_clear() -> Result<()> {
    let dir = default_cache_dir();
    if clear_dir(&dir)? {
        println!("Removed {}", dir.display());
    } else {
        println!("Cache is already empty");
    }
    Ok(())
}

/// Remove `dir` and everything in it. Returns false if it didn't exist.
fn clear_dir(dir: &Path) -> Result<bool> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(KitschError::io(
            format!("failed to remove cache directory '{}'", dir.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, FileCache};
    use tempfile::TempDir;

    #[test]
    fn test_clear_removes_cached_values() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("kitsch");
        let cache = FileCache::new(&dir);
        cache.set("key", b"value").unwrap();
        assert!(dir.exists());

        assert!(clear_dir(&dir).unwrap());
        assert!(!dir.exists());
        assert!(cache.get("key").is_none());
    }

    #[test]
    fn test_clear_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(!clear_dir(&temp.path().join("nothing")).unwrap());
    }
}
