//! Error types for kitsch.
//!
//! Uses thiserror for derive macros. Module-level failures never reach the
//! user as errors (they become warnings and empty results); these variants
//! surface from configuration loading, the CLI, and the lower layers that
//! modules call into.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for kitsch operations.
#[derive(Error, Debug)]
pub enum KitschError {
    /// Configuration could not be read, parsed, or validated.
    #[error("{0}")]
    Config(String),

    /// A chain of `extends` is longer than we are willing to follow.
    #[error("too many nested extends (at '{0}')")]
    ExtendsTooDeep(String),

    /// A style descriptor or gradient could not be parsed.
    #[error("invalid style \"{token}\" at position {position}: {message}")]
    InvalidStyle {
        token: String,
        position: usize,
        message: String,
    },

    /// A `$name` colour was referenced but never defined.
    #[error("unknown custom color \"{0}\"")]
    UnknownCustomColor(String),

    /// Template parsing or execution failed.
    #[error("template error: {0}")]
    Template(String),

    /// A getter could not produce a value.
    #[error("getter failed: {0}")]
    Getter(String),

    /// Git subprocess failed.
    #[error("Git operation failed: {0}")]
    Git(String),

    /// Filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The target shell is not supported.
    #[error("unknown shell \"{0}\"")]
    UnknownShell(String),
}

impl KitschError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        KitschError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            KitschError::Config(_)
            | KitschError::ExtendsTooDeep(_)
            | KitschError::InvalidStyle { .. }
            | KitschError::UnknownCustomColor(_)
            | KitschError::Template(_) => exit_codes::CONFIG_FAILURE,
            KitschError::UnknownShell(_) => exit_codes::USER_ERROR,
            KitschError::Getter(_) | KitschError::Git(_) | KitschError::Io { .. } => {
                exit_codes::RUNTIME_FAILURE
            }
        }
    }
}

/// Result type alias for kitsch operations.
pub type Result<T> = std::result::Result<T, KitschError>;
