//! Persistent value cache.
//!
//! Slow external probes (`node --version`, `java -Xinternalversion`, ...) are
//! memoized between prompt invocations. Reads never fail: any problem reading
//! a record is treated as a miss.

mod file;
mod framing;

pub use file::FileCache;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;

pub trait Cache: Send + Sync {
    /// Returns the stored value, or `None` on a miss or any read error.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

/// In-process cache, used by demo mode and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(key);
        Ok(())
    }
}
