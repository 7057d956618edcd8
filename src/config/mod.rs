//! Configuration loading.
//!
//! A configuration is a YAML file with the root `prompt` module, custom
//! `colors`, extra `projectTypes`, and a few timeouts. One file may
//! `extends` another; whatever the child leaves out is taken from the
//! parent.

mod model;
mod operations;

#[cfg(test)]
mod tests;

pub use model::{Config, DEFAULT_CONFIG};
pub use operations::{default_cache_dir, default_config_file};
