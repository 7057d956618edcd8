//! How the current branch compares to its upstream.

use super::{Module, ModuleResult};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitDivergedModule {
    ahead_symbol: String,
    behind_symbol: String,
    diverged_symbol: String,
    up_to_date_symbol: String,
    no_upstream_symbol: String,
}

impl Default for GitDivergedModule {
    fn default() -> Self {
        GitDivergedModule {
            ahead_symbol: "↑".to_string(),
            behind_symbol: "↓".to_string(),
            diverged_symbol: "↕".to_string(),
            up_to_date_symbol: "≡".to_string(),
            no_upstream_symbol: "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum AheadBehind {
    Ahead,
    Behind,
    Diverged,
    UpToDate,
    NoUpstream,
}

impl AheadBehind {
    fn classify(has_upstream: bool, ahead: usize, behind: usize) -> Self {
        match (has_upstream, ahead > 0, behind > 0) {
            (false, _, _) => AheadBehind::NoUpstream,
            (true, true, true) => AheadBehind::Diverged,
            (true, true, false) => AheadBehind::Ahead,
            (true, false, true) => AheadBehind::Behind,
            (true, false, false) => AheadBehind::UpToDate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GitDivergedData {
    upstream: String,
    ahead: usize,
    behind: usize,
    symbol: String,
    ahead_behind: AheadBehind,
}

impl GitDivergedModule {
    fn symbol(&self, ahead_behind: AheadBehind) -> &str {
        match ahead_behind {
            AheadBehind::Ahead => &self.ahead_symbol,
            AheadBehind::Behind => &self.behind_symbol,
            AheadBehind::Diverged => &self.diverged_symbol,
            AheadBehind::UpToDate => &self.up_to_date_symbol,
            AheadBehind::NoUpstream => &self.no_upstream_symbol,
        }
    }

    /// `↓2 ↑1`, or just the symbol when in step with (or without) an
    /// upstream.
    fn default_text(&self, data: &GitDivergedData) -> String {
        let mut parts = Vec::new();
        if data.behind > 0 {
            parts.push(format!("{}{}", self.behind_symbol, data.behind));
        }
        if data.ahead > 0 {
            parts.push(format!("{}{}", self.ahead_symbol, data.ahead));
        }
        if parts.is_empty() {
            parts.push(data.symbol.clone());
        }
        parts.join(" ")
    }
}

impl Module for GitDivergedModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let Some(git) = context.git() else {
            return ModuleResult::empty();
        };
        let head = match git.head(0) {
            Ok(head) => head,
            Err(err) => {
                tracing::debug!("could not read HEAD: {}", err);
                return ModuleResult::empty();
            }
        };

        let upstream = if head.detached {
            None
        } else {
            git.upstream(&head.description)
        };
        let (ahead, behind) = match &upstream {
            Some(upstream) => git
                .ahead_behind(
                    &format!("refs/heads/{}", head.description),
                    &format!("refs/remotes/{}", upstream),
                )
                .unwrap_or_else(|err| {
                    tracing::debug!("could not count commits against {}: {}", upstream, err);
                    (0, 0)
                }),
            None => (0, 0),
        };

        let ahead_behind = AheadBehind::classify(upstream.is_some(), ahead, behind);
        let data = GitDivergedData {
            upstream: upstream.unwrap_or_default(),
            ahead,
            behind,
            symbol: self.symbol(ahead_behind).to_string(),
            ahead_behind,
        };
        ModuleResult::with_data(self.default_text(&data), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DemoGit, Git};
    use crate::template::Value;
    use crate::test_support::test_context;
    use std::path::Path;

    fn run(upstream: &str, ahead: usize, behind: usize) -> ModuleResult {
        let git = DemoGit {
            head: "main".to_string(),
            upstream: upstream.to_string(),
            ahead,
            behind,
            ..DemoGit::default()
        };
        let context = test_context(Path::new("/tmp")).with_git(Some(Arc::new(git) as Arc<dyn Git>));
        GitDivergedModule::default().execute(&Arc::new(context))
    }

    fn symbol(result: &ModuleResult) -> &Value {
        result.data.field("Symbol").unwrap()
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbol(&run("origin/main", 0, 0)), &Value::from("≡"));
        assert_eq!(symbol(&run("origin/main", 2, 0)), &Value::from("↑"));
        assert_eq!(symbol(&run("origin/main", 0, 3)), &Value::from("↓"));
        assert_eq!(symbol(&run("origin/main", 2, 3)), &Value::from("↕"));
        assert_eq!(symbol(&run("", 0, 0)), &Value::from("?"));
    }

    #[test]
    fn test_default_text() {
        assert_eq!(run("origin/main", 0, 0).default_text, "≡");
        assert_eq!(run("origin/main", 2, 0).default_text, "↑2");
        assert_eq!(run("origin/main", 2, 3).default_text, "↓3 ↑2");
        assert_eq!(run("", 0, 0).default_text, "?");
    }

    #[test]
    fn test_data() {
        let result = run("origin/main", 0, 3);
        assert_eq!(result.data.field("AheadBehind"), Some(&Value::from("behind")));
        assert_eq!(result.data.field("Upstream"), Some(&Value::from("origin/main")));
        assert_eq!(run("", 0, 0).data.field("AheadBehind"), Some(&Value::from("noUpstream")));
    }
}
