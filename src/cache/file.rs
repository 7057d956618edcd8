//! On-disk value cache, partitioned by the SHA-1 of the key.

use super::Cache;
use super::framing;
use crate::error::{KitschError, Result};
use crate::fs::atomic_write;
use sha1::{Digest, Sha1};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<hex[0:2]>/<hex[2:]>.cache`
    pub(crate) fn path_for_key(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha1::digest(key.as_bytes()));
        self.root
            .join(&digest[..2])
            .join(format!("{}.cache", &digest[2..]))
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for_key(key);
        let data = fs::read(&path).ok()?;

        match framing::decode(&data) {
            Ok(record) if record.key == key.as_bytes() => Some(record.value),
            Ok(_) => {
                tracing::debug!("cache key mismatch at {}", path.display());
                None
            }
            Err(e) => {
                tracing::debug!("dropping corrupt cache record {}: {}", path.display(), e);
                let _ = self.delete(key);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for_key(key);
        atomic_write(&path, &framing::encode(key.as_bytes(), value))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KitschError::io(
                format!("failed to delete cache entry '{}'", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(temp.path());

        cache.set("/usr/bin/node --version", b"v18.12.1").unwrap();

        assert_eq!(
            cache.get("/usr/bin/node --version"),
            Some(b"v18.12.1".to_vec())
        );
        assert_eq!(cache.get("/usr/bin/node -v"), None);
    }

    #[test]
    fn test_path_is_partitioned_by_sha1() {
        let cache = FileCache::new("/cache");
        // sha1("hello") = aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d
        assert_eq!(
            cache.path_for_key("hello"),
            PathBuf::from("/cache/aa/f4c61ddcc5e8a2dabede0f3b482cd9aea9434d.cache")
        );
    }

    #[test]
    fn test_colliding_record_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(temp.path());

        // Simulate a hash collision by planting k1's record where k2 lives.
        cache.set("k1", b"v1").unwrap();
        let k1_path = cache.path_for_key("k1");
        let k2_path = cache.path_for_key("k2");
        fs::create_dir_all(k2_path.parent().unwrap()).unwrap();
        fs::copy(&k1_path, &k2_path).unwrap();

        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.get("k1"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_corrupt_record_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(temp.path());
        let path = cache.path_for_key("key");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"garbage").unwrap();

        assert_eq!(cache.get("key"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(temp.path());

        cache.set("key", b"value").unwrap();
        cache.delete("key").unwrap();
        assert_eq!(cache.get("key"), None);

        // Deleting a missing key is fine.
        cache.delete("key").unwrap();
    }

    #[test]
    fn test_overwrite() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(temp.path());

        cache.set("key", b"one").unwrap();
        cache.set("key", b"two").unwrap();
        assert_eq!(cache.get("key"), Some(b"two".to_vec()));
    }
}
