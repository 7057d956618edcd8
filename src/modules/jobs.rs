use super::{Module, ModuleResult};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Background jobs in the shell: nothing, a symbol, or a symbol and a count.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobsModule {
    symbol: String,
    /// Show the symbol from this many jobs.
    symbol_threshold: i64,
    /// Show the count from this many jobs.
    count_threshold: i64,
}

impl Default for JobsModule {
    fn default() -> Self {
        JobsModule {
            symbol: "+".to_string(),
            symbol_threshold: 1,
            count_threshold: 2,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JobsData {
    jobs: i64,
    show_symbol: bool,
    show_count: bool,
}

impl Module for JobsModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let jobs = context.globals.jobs;
        let show_symbol = jobs >= self.symbol_threshold;
        let show_count = jobs >= self.count_threshold;

        let mut text = String::new();
        if show_symbol {
            text.push_str(&self.symbol);
        }
        if show_count {
            text.push_str(&jobs.to_string());
        }

        ModuleResult::with_data(
            text,
            &JobsData {
                jobs,
                show_symbol,
                show_count,
            },
        )
    }
}
