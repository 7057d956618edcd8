//! Counts of staged, unstaged, and unmerged changes, and stashes.

use super::{Module, ModuleResult, apply_style, validate_style};
use crate::context::Context;
use crate::git::{FileStats, GitStats};
use crate::logging;
use crate::style::Registry;
use crate::template::Value;
use serde::Deserialize;
use std::sync::Arc;

fn default_index_style() -> String {
    "green".to_string()
}

fn default_unstaged_style() -> String {
    "red".to_string()
}

fn default_stash_style() -> String {
    "brightRed".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatusModule {
    #[serde(default = "default_index_style")]
    index_style: String,
    #[serde(default = "default_unstaged_style")]
    unstaged_style: String,
    #[serde(default = "default_stash_style")]
    stash_style: String,
}

fn stats_value(stats: &FileStats) -> Value {
    Value::map([
        ("Added", Value::Int(stats.added as i64)),
        ("Modified", Value::Int(stats.modified as i64)),
        ("Deleted", Value::Int(stats.deleted as i64)),
        ("Total", Value::Int(stats.total() as i64)),
    ])
}

fn render_stats(stats: &FileStats) -> String {
    format!("+{} ~{} -{}", stats.added, stats.modified, stats.deleted)
}

impl GitStatusModule {
    /// `+1 ~2 -0 !1 | +0 ~3 -1 (2)`, each part in its own style.
    fn default_text(&self, context: &Context, stats: &GitStats, stash_count: usize) -> String {
        let mut parts = Vec::new();
        let index_total = stats.index.total();
        let unstaged_total = stats.unstaged.total();

        if index_total > 0 || stats.unmerged > 0 {
            let mut index = render_stats(&stats.index);
            if stats.unmerged > 0 {
                index.push_str(&format!(" !{}", stats.unmerged));
            }
            parts.push(apply_style(context, &self.index_style, &index));
        }
        if index_total > 0 && unstaged_total > 0 {
            parts.push("|".to_string());
        }
        if unstaged_total > 0 {
            parts.push(apply_style(
                context,
                &self.unstaged_style,
                &render_stats(&stats.unstaged),
            ));
        }
        if stash_count > 0 {
            parts.push(apply_style(
                context,
                &self.stash_style,
                &format!("({})", stash_count),
            ));
        }
        parts.join(" ")
    }
}

impl Module for GitStatusModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let Some(git) = context.git() else {
            return ModuleResult::empty();
        };

        let stats = match git.stats() {
            Ok(stats) => stats,
            Err(err) => {
                logging::warn(format!("error getting git status: {}", err));
                return ModuleResult::empty();
            }
        };
        let stash_count = git.stash_count().unwrap_or_else(|err| {
            logging::warn(format!("error getting stash count: {}", err));
            0
        });

        let data = Value::map([
            ("Index", stats_value(&stats.index)),
            ("Unstaged", stats_value(&stats.unstaged)),
            ("Unmerged", Value::Int(stats.unmerged as i64)),
            ("StashCount", Value::Int(stash_count as i64)),
        ]);
        ModuleResult::new(self.default_text(context, &stats, stash_count), data)
    }

    fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        validate_style(styles, "git_status indexStyle", &self.index_style, errors);
        validate_style(styles, "git_status unstagedStyle", &self.unstaged_style, errors);
        validate_style(styles, "git_status stashStyle", &self.stash_style, errors);
    }
}
