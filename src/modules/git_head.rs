//! The current branch, tag, or commit.

use super::{Module, ModuleResult};
use crate::context::Context;
use crate::git::short_hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_max_tags_to_search() -> i64 {
    200
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHeadModule {
    /// When HEAD is detached, how many tags to check for one that points at
    /// it. Negative searches them all.
    #[serde(default = "default_max_tags_to_search")]
    max_tags_to_search: i64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GitHeadData {
    description: String,
    detached: bool,
    hash: String,
    short_hash: String,
    is_tag: bool,
    upstream: String,
}

impl Module for GitHeadModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let Some(git) = context.git() else {
            return ModuleResult::with_data("", &GitHeadData::default());
        };

        let head = match git.head(self.max_tags_to_search) {
            Ok(head) => head,
            Err(err) => {
                tracing::debug!("could not read HEAD: {}", err);
                return ModuleResult::with_data(
                    "???",
                    &GitHeadData {
                        description: "???".to_string(),
                        detached: true,
                        hash: "???".to_string(),
                        ..GitHeadData::default()
                    },
                );
            }
        };

        let upstream = if head.detached {
            String::new()
        } else {
            git.upstream(&head.description).unwrap_or_default()
        };

        ModuleResult::with_data(
            head.description.clone(),
            &GitHeadData {
                short_hash: short_hash(&head.hash).to_string(),
                description: head.description,
                detached: head.detached,
                hash: head.hash,
                is_tag: head.is_tag,
                upstream,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DemoGit, Git};
    use crate::template::Value;
    use crate::test_support::test_context;
    use std::path::Path;

    fn run(git: Option<DemoGit>) -> ModuleResult {
        let module: GitHeadModule = serde_yaml::from_str("{}").unwrap();
        let context = test_context(Path::new("/tmp"))
            .with_git(git.map(|g| Arc::new(g) as Arc<dyn Git>));
        module.execute(&Arc::new(context))
    }

    #[test]
    fn test_branch() {
        let result = run(Some(DemoGit {
            head: "main".to_string(),
            upstream: "origin/main".to_string(),
            ..DemoGit::default()
        }));
        assert_eq!(result.default_text, "main");
        assert_eq!(result.data.field("Upstream"), Some(&Value::from("origin/main")));
        assert_eq!(result.data.field("Detached"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_detached_hash() {
        let result = run(Some(DemoGit {
            head: "0123456789abcdef0123456789abcdef01234567".to_string(),
            is_detached: true,
            ..DemoGit::default()
        }));
        assert_eq!(result.default_text, "(0123456…)");
        assert_eq!(result.data.field("ShortHash"), Some(&Value::from("0123456")));
        assert_eq!(result.data.field("Upstream"), Some(&Value::from("")));
    }

    #[test]
    fn test_no_repo() {
        assert_eq!(run(None).default_text, "");
    }
}
