//! Atomic file writes.
//!
//! Several prompt processes may run at once (one per open terminal) and all
//! of them share the value cache, so a reader must never observe a partially
//! written record. Every write follows the same pattern:
//!
//! 1. Write content to a uniquely named temporary file in the target directory
//! 2. Sync the file to disk
//! 3. Rename it over the target
//!
//! On any failure the temporary file is removed.

use crate::error::{KitschError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        create_private_dir(parent)?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)
}

/// Create a directory (and its parents) readable only by the current user.
fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|e| {
        KitschError::io(format!("failed to create directory '{}'", path.display()), e)
    })
}

/// Temporary files are unique per process and per write so concurrent
/// writers never share one.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KitschError::Config(format!("invalid file path '{}'", target.display())))?;

    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}.{}.tmp", filename, std::process::id(), n);
    Ok(parent.join(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        KitschError::io(
            format!("failed to create temporary file '{}'", path.display()),
            e,
        )
    })?;

    let written = file.write_all(content).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(KitschError::io("failed to write temporary file", e));
    }

    Ok(())
}

#[cfg(unix)]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        KitschError::io(
            format!("failed to atomically replace '{}'", target.display()),
            e,
        )
    })
}

#[cfg(windows)]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    // rename() refuses to overwrite on some Windows filesystems.
    if let Err(first) = fs::rename(source, target) {
        if first.kind() != std::io::ErrorKind::AlreadyExists
            && first.kind() != std::io::ErrorKind::PermissionDenied
        {
            let _ = fs::remove_file(source);
            return Err(KitschError::io(
                format!("failed to atomically replace '{}'", target.display()),
                first,
            ));
        }
        let _ = fs::remove_file(target);
        fs::rename(source, target).map_err(|e| {
            let _ = fs::remove_file(source);
            KitschError::io(
                format!("failed to atomically replace '{}'", target.display()),
                e,
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("ab").join("cdef.cache");

        atomic_write(&file_path, b"hello world").unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), b"hello world");
        assert!(leftover_temp_files(file_path.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("value.cache");
        fs::write(&file_path, "original content").unwrap();

        atomic_write(&file_path, b"new content").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directories_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("cache").join("12").join("34.cache");

        atomic_write(&file_path, b"x").unwrap();

        let mode = fs::metadata(file_path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let target = Path::new("/some/path/file.cache");
        let a = generate_temp_path(target).unwrap();
        let b = generate_temp_path(target).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.parent().unwrap(), Path::new("/some/path"));
        assert!(a.file_name().unwrap().to_str().unwrap().starts_with(".file.cache."));
    }

    #[test]
    fn test_concurrent_writers_to_same_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shared.cache");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    atomic_write(&path, format!("writer {}", i).as_bytes()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("writer "));
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }
}
