//! System CPU usage, sampled over a short interval.

use super::{Module, ModuleResult};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

fn default_min_percent() -> f64 {
    5.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuModule {
    /// Usage at or below this is not shown.
    #[serde(default = "default_min_percent")]
    min_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CpuData {
    percent: f64,
}

/// Busy and total jiffies from the aggregate `cpu` line of `/proc/stat`.
fn parse_proc_stat(contents: &str) -> Option<(u64, u64)> {
    let line = contents.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse().ok())
        .collect::<Option<_>>()?;
    if values.len() < 4 {
        return None;
    }
    let total: u64 = values.iter().sum();
    // idle + iowait
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Some((total - idle, total))
}

fn usage_between(before: (u64, u64), after: (u64, u64)) -> f64 {
    let busy = after.0.saturating_sub(before.0);
    let total = after.1.saturating_sub(before.1);
    if total == 0 {
        0.0
    } else {
        busy as f64 * 100.0 / total as f64
    }
}

#[cfg(target_os = "linux")]
fn sample_cpu() -> Option<f64> {
    let read = || {
        std::fs::read_to_string("/proc/stat")
            .ok()
            .and_then(|s| parse_proc_stat(&s))
    };
    let before = read()?;
    std::thread::sleep(SAMPLE_INTERVAL);
    let after = read()?;
    Some(usage_between(before, after))
}

#[cfg(not(target_os = "linux"))]
fn sample_cpu() -> Option<f64> {
    let _ = SAMPLE_INTERVAL;
    None
}

impl Module for CpuModule {
    fn execute(&self, _context: &Arc<Context>) -> ModuleResult {
        let percent = sample_cpu().unwrap_or(0.0);
        let text = if percent > self.min_percent {
            format!("{:.0}%", percent)
        } else {
            String::new()
        };
        ModuleResult::with_data(text, &CpuData { percent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat() {
        let stat = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";
        assert_eq!(parse_proc_stat(stat), Some((200, 1000)));
        assert_eq!(parse_proc_stat("intr 1 2 3"), None);
    }

    #[test]
    fn test_usage_between() {
        assert_eq!(usage_between((200, 1000), (300, 1200)), 50.0);
        assert_eq!(usage_between((200, 1000), (200, 1000)), 0.0);
    }
}
