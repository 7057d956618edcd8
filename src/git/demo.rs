//! A [`Git`] that answers from fixed values, for demo mode and tests.

use super::{Git, GitStats, HeadInfo, RepositoryState, SHORT_HASH_LENGTH, StateKind};
use crate::error::{KitschError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoGit {
    pub repo_root: PathBuf,
    /// Branch name, or a hash or tag name when detached.
    pub head: String,
    pub is_detached: bool,
    /// Upstream of the current branch, e.g. `origin/main`.
    pub upstream: String,
    pub state: StateKind,
    pub step: String,
    pub total: String,
    pub stash_count: usize,
    pub ahead: usize,
    pub behind: usize,
    pub stats: GitStats,
}

fn is_full_hash(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Git for DemoGit {
    fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn stash_count(&self) -> Result<usize> {
        Ok(self.stash_count)
    }

    fn upstream(&self, _branch: &str) -> Option<String> {
        (!self.is_detached && !self.upstream.is_empty()).then(|| self.upstream.clone())
    }

    fn ahead_behind(&self, local: &str, remote: &str) -> Result<(usize, usize)> {
        let local = local.strip_prefix("refs/heads/").unwrap_or(local);
        let remote = remote.strip_prefix("refs/remotes/").unwrap_or(remote);
        if !self.is_detached && (local == self.head || local == "HEAD") && remote == self.upstream {
            Ok((self.ahead, self.behind))
        } else {
            Err(KitschError::Git(format!("unknown refs {}...{}", local, remote)))
        }
    }

    fn head(&self, _max_tags_to_search: i64) -> Result<HeadInfo> {
        if !self.is_detached {
            return Ok(HeadInfo {
                description: self.head.clone(),
                detached: false,
                hash: String::new(),
                is_tag: false,
            });
        }

        if is_full_hash(&self.head) {
            Ok(HeadInfo {
                description: format!("({}…)", &self.head[..SHORT_HASH_LENGTH]),
                detached: true,
                hash: self.head.clone(),
                is_tag: false,
            })
        } else {
            Ok(HeadInfo {
                description: format!("({})", self.head),
                detached: true,
                hash: String::new(),
                is_tag: true,
            })
        }
    }

    fn state(&self) -> RepositoryState {
        RepositoryState {
            state: self.state,
            step: self.step.clone(),
            total: self.total.clone(),
        }
    }

    fn stats(&self) -> Result<GitStats> {
        Ok(self.stats)
    }
}
