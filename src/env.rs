//! Access to environment variables.
//!
//! Modules read the environment through [`Environment`] so tests and demo
//! mode can supply a fixed set of variables.

use std::collections::HashMap;

pub trait Environment: Send + Sync {
    /// The value of `key`, or `None` if it is unset.
    fn var(&self, key: &str) -> Option<String>;

    /// The value of `key`, or the empty string.
    fn getenv(&self, key: &str) -> String {
        self.var(key).unwrap_or_default()
    }

    /// True if at least one of `keys` is set and non-empty.
    fn has_some(&self, keys: &[&str]) -> bool {
        keys.iter()
            .any(|key| self.var(key).is_some_and(|v| !v.is_empty()))
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new(vars: HashMap<String, String>) -> Self {
        MapEnvironment { vars }
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        MapEnvironment {
            vars: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
