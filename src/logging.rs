//! Logging setup and the warning gate used by modules.
//!
//! Everything is written to stderr so it never mixes with the prompt on
//! stdout. In non-verbose mode only the first module warning of an
//! invocation is shown; a broken module should not bury the prompt under
//! repeated messages.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static VERBOSE: AtomicBool = AtomicBool::new(false);
static WARNED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber. `KITSCH_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);

    let default_filter = if verbose { "kitsch=debug" } else { "kitsch=warn" };
    let filter = EnvFilter::try_from_env("KITSCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Returns true if a warning should be emitted now, and marks the gate.
fn should_warn() -> bool {
    if is_verbose() {
        return true;
    }
    !WARNED.swap(true, Ordering::Relaxed)
}

/// Emit a rate-limited warning.
pub fn warn(message: impl Display) {
    if should_warn() {
        tracing::warn!("{}", message);
    } else {
        tracing::debug!("suppressed warning: {}", message);
    }
}

#[cfg(test)]
pub(crate) fn reset_warning_gate() {
    WARNED.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn only_first_warning_passes_when_quiet() {
        set_verbose(false);
        reset_warning_gate();

        assert!(should_warn());
        assert!(!should_warn());
        assert!(!should_warn());
    }

    #[test]
    #[serial]
    fn every_warning_passes_when_verbose() {
        set_verbose(true);
        reset_warning_gate();

        assert!(should_warn());
        assert!(should_warn());

        set_verbose(false);
    }
}
