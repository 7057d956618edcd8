//! How long the previous command took.

use super::{Module, ModuleResult};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_min_time() -> i64 {
    2000
}

/// How long the previous command took, when it took a while.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDurationModule {
    /// Shorter durations, in milliseconds, are not shown.
    #[serde(default = "default_min_time")]
    min_time: i64,
    #[serde(default)]
    show_milliseconds: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandDurationData {
    /// Milliseconds.
    duration: i64,
    pretty_duration: String,
}

/// `1h2m3s` style. Without milliseconds the duration is rounded to the
/// nearest second; with them, seconds are truncated and the remainder
/// appended as `Nms`.
fn pretty_duration(ms: i64, show_milliseconds: bool) -> String {
    let ms = ms.max(0);
    let seconds = if show_milliseconds {
        ms / 1000
    } else {
        ms.saturating_add(500) / 1000
    };

    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    let mut out = if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };

    if show_milliseconds {
        out.push_str(&format!("{}ms", ms % 1000));
    }
    out
}

impl Module for CommandDurationModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let duration = context.globals.previous_command_duration;
        let pretty = pretty_duration(duration, self.show_milliseconds);
        let text = if duration >= self.min_time {
            pretty.clone()
        } else {
            String::new()
        };

        ModuleResult::with_data(
            text,
            &CommandDurationData {
                duration,
                pretty_duration: pretty,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::path::Path;

    fn render(yaml: &str, duration: i64) -> String {
        let module: CommandDurationModule = serde_yaml::from_str(yaml).unwrap();
        let mut context = test_context(Path::new("/tmp"));
        context.globals.previous_command_duration = duration;
        module.execute(&Arc::new(context)).default_text
    }

    #[test]
    fn test_min_time() {
        assert_eq!(render("minTime: 2000", 1000), "");
        assert_eq!(render("minTime: 2000", 4000), "4s");
        assert_eq!(render("{}", 1999), "");
        assert_eq!(render("{}", 2000), "2s");
    }

    #[test]
    fn test_formatting() {
        assert_eq!(render("{}", 60000), "1m0s");
        assert_eq!(render("{}", 69001), "1m9s");
        assert_eq!(render("{}", 2500), "3s");
        assert_eq!(render("{}", 3_600_000), "1h0m0s");
    }

    #[test]
    fn test_show_milliseconds() {
        assert_eq!(render("showMilliseconds: true", 69001), "1m9s1ms");
        assert_eq!(render("showMilliseconds: true", 10_000_000), "2h46m40s0ms");
        assert_eq!(render("showMilliseconds: true", 2500), "2s500ms");
    }

    #[test]
    fn test_huge_duration_does_not_overflow() {
        assert_eq!(render("{}", i64::MAX), "2562047788015h12m55s");
    }
}
