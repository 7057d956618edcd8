//! Exit code constants for the kitsch CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unknown shell)
//! - 2: Configuration failure (unreadable or invalid config, bad style)
//! - 3: Runtime failure (I/O, git, getter)
//!
//! The `prompt` subcommand always exits with `SUCCESS` after printing a
//! fallback prompt, so the shell is never left without one.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an unsupported shell.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: unreadable file, parse error, invalid style or template.
pub const CONFIG_FAILURE: i32 = 2;

/// Runtime failure: filesystem, git, or getter errors.
pub const RUNTIME_FAILURE: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, CONFIG_FAILURE, RUNTIME_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
