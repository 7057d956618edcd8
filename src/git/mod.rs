//! Git repository inspection.
//!
//! Modules see a repository through the [`Git`] trait. The real
//! implementation ([`GitRepo`]) runs read-only git subcommands and reads a
//! few files under the git directory; [`CachingGit`] memoizes its answers
//! for the length of one prompt; [`DemoGit`] answers from fixed values.

mod caching;
mod demo;
mod repo;
mod runner;
mod status;

pub use caching::CachingGit;
pub use demo::DemoGit;
pub use repo::GitRepo;
pub use status::{FileStats, GitStats};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const SHORT_HASH_LENGTH: usize = 7;

/// An operation in progress in the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "REBASE-i")]
    RebasingInteractive,
    #[serde(rename = "REBASE-m")]
    RebaseMerging,
    #[serde(rename = "REBASE")]
    Rebasing,
    #[serde(rename = "AM")]
    Aming,
    #[serde(rename = "REBASE/AM")]
    RebaseAming,
    #[serde(rename = "MERGING")]
    Merging,
    #[serde(rename = "CHERRY-PICKING")]
    CherryPicking,
    #[serde(rename = "REVERTING")]
    Reverting,
    #[serde(rename = "BISECTING")]
    Bisecting,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::None => "",
            StateKind::RebasingInteractive => "REBASE-i",
            StateKind::RebaseMerging => "REBASE-m",
            StateKind::Rebasing => "REBASE",
            StateKind::Aming => "AM",
            StateKind::RebaseAming => "REBASE/AM",
            StateKind::Merging => "MERGING",
            StateKind::CherryPicking => "CHERRY-PICKING",
            StateKind::Reverting => "REVERTING",
            StateKind::Bisecting => "BISECTING",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    pub state: StateKind,
    /// Current step of a rebase or `am`; empty otherwise.
    pub step: String,
    /// Total steps of a rebase or `am`; empty otherwise.
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    /// The branch name; while detached, the branch being rebased, the tag
    /// name in parentheses, or a short hash.
    pub description: String,
    pub detached: bool,
    /// Full hash of HEAD; empty in a repository with no commits.
    pub hash: String,
    pub is_tag: bool,
}

pub trait Git: Send + Sync {
    fn repo_root(&self) -> &Path;

    fn stash_count(&self) -> Result<usize>;

    /// The upstream of `branch` (e.g. `origin/main`), if it has one.
    fn upstream(&self, branch: &str) -> Option<String>;

    /// How many commits `local` is ahead of and behind `remote`.
    fn ahead_behind(&self, local: &str, remote: &str) -> Result<(usize, usize)>;

    /// Describe HEAD, searching at most `max_tags_to_search` tags for one
    /// pointing at it (negative searches every tag).
    fn head(&self, max_tags_to_search: i64) -> Result<HeadInfo>;

    fn state(&self) -> RepositoryState;

    fn stats(&self) -> Result<GitStats>;
}

/// Shorten a full hash for display.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LENGTH) {
        Some((i, _)) => &hash[..i],
        None => hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_kind_strings() {
        assert_eq!(StateKind::RebasingInteractive.to_string(), "REBASE-i");
        assert_eq!(StateKind::None.to_string(), "");
        let parsed: StateKind = serde_yaml::from_str("CHERRY-PICKING").unwrap();
        assert_eq!(parsed, StateKind::CherryPicking);
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }
}
