//! Rebase, merge, and other operations in progress.

use super::{Module, ModuleResult};
use crate::context::Context;
use crate::git::StateKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Text to show for each state. Empty fields use the state's own name
/// (`REBASE-i`, `MERGING`, ...).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitStateModule {
    rebase_interactive: String,
    rebase_merging: String,
    rebasing: String,
    aming: String,
    #[serde(rename = "rebaseAMing")]
    rebase_aming: String,
    merging: String,
    cherry_picking: String,
    reverting: String,
    bisecting: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GitStateData {
    state: StateKind,
    step: String,
    total: String,
}

impl GitStateModule {
    fn describe(&self, state: StateKind) -> &str {
        let configured = match state {
            StateKind::None => return "",
            StateKind::RebasingInteractive => &self.rebase_interactive,
            StateKind::RebaseMerging => &self.rebase_merging,
            StateKind::Rebasing => &self.rebasing,
            StateKind::Aming => &self.aming,
            StateKind::RebaseAming => &self.rebase_aming,
            StateKind::Merging => &self.merging,
            StateKind::CherryPicking => &self.cherry_picking,
            StateKind::Reverting => &self.reverting,
            StateKind::Bisecting => &self.bisecting,
        };
        if configured.is_empty() {
            state.as_str()
        } else {
            configured
        }
    }
}

impl Module for GitStateModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let Some(git) = context.git() else {
            return ModuleResult::empty();
        };

        let state = git.state();
        let mut text = self.describe(state.state).to_string();
        if !text.is_empty() && !state.total.is_empty() {
            text.push_str(&format!(" {}/{}", state.step, state.total));
        }

        ModuleResult::with_data(
            text,
            &GitStateData {
                state: state.state,
                step: state.step,
                total: state.total,
            },
        )
    }
}
