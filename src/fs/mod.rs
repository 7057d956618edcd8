//! Filesystem utilities for kitsch.
//!
//! Atomic writes for the value cache, the `Directory` capability modules use
//! to probe the working directory, and a few path lookups.

mod atomic;
mod directory;
mod paths;

pub use atomic::atomic_write;
pub use directory::Directory;
pub use paths::{find_file_in_ancestors, look_path_safe};
