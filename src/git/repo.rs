//! The real repository, inspected through git subprocesses and the files
//! git keeps in its git directory.

use super::runner::{run_git, stream_git};
use super::status::{GitStats, StatusCounter};
use super::{Git, HeadInfo, RepositoryState, SHORT_HASH_LENGTH, StateKind};
use crate::error::{KitschError, Result};
use crate::fs::{find_file_in_ancestors, look_path_safe};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GitRepo {
    git: PathBuf,
    root: PathBuf,
    git_dir: PathBuf,
}

/// Resolve `.git` to the git directory. In linked worktrees and
/// submodules `.git` is a file containing `gitdir: <path>`.
fn resolve_git_dir(dot_git: &Path) -> Option<PathBuf> {
    if dot_git.is_dir() {
        return Some(dot_git.to_path_buf());
    }
    let contents = fs::read_to_string(dot_git).ok()?;
    let target = contents.trim().strip_prefix("gitdir:")?.trim();
    let target = Path::new(target);
    if target.is_absolute() {
        Some(target.to_path_buf())
    } else {
        Some(dot_git.parent()?.join(target))
    }
}

fn extract_branch_name(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix("refs/heads/").unwrap_or(name).to_string()
}

impl GitRepo {
    /// Open the repository containing `cwd`, if there is one. Returns `None`
    /// when `cwd` is not in a repository or `git` is not installed.
    pub fn open(git: &str, cwd: &Path) -> Option<GitRepo> {
        let dot_git = find_file_in_ancestors(cwd, ".git")?;
        let root = dot_git.parent()?.to_path_buf();
        let git_dir = resolve_git_dir(&dot_git)?;
        let git = look_path_safe(git)?;
        tracing::debug!("found git repo at {}", root.display());
        Some(GitRepo { git, root, git_dir })
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        Ok(run_git(&self.git, &self.root, args)?.text())
    }

    fn exists(&self, path: &str) -> bool {
        self.git_dir.join(path).exists()
    }

    fn read(&self, path: &str) -> String {
        fs::read_to_string(self.git_dir.join(path))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// The name of the tag pointing at `hash`, checking lightweight tags and
    /// the targets of annotated tags.
    fn tag_for_hash(&self, hash: &str, max_tags_to_search: i64) -> Option<String> {
        if max_tags_to_search == 0 || hash.is_empty() {
            return None;
        }
        let count = format!("--count={}", max_tags_to_search);
        let mut args = vec![
            "for-each-ref",
            "--format=%(objectname) %(*objectname) %(refname:short)",
        ];
        if max_tags_to_search > 0 {
            args.push(&count);
        }
        args.push("refs/tags");

        let output = self.git(&args).ok()?;
        output.lines().find_map(|line| {
            // `%(*objectname)` is empty for lightweight tags, leaving two spaces.
            let mut parts = line.splitn(3, ' ');
            let object = parts.next()?;
            let target = parts.next()?;
            let name = parts.next()?;
            (object.starts_with(hash) || (!target.is_empty() && target.starts_with(hash)))
                .then(|| name.to_string())
        })
    }
}

impl Git for GitRepo {
    fn repo_root(&self) -> &Path {
        &self.root
    }

    fn stash_count(&self) -> Result<usize> {
        if !self.exists("logs/refs/stash") {
            return Ok(0);
        }
        let count = self.git(&["rev-list", "--walk-reflogs", "--count", "refs/stash"])?;
        count
            .parse()
            .map_err(|_| KitschError::Git(format!("unexpected stash count {:?}", count)))
    }

    fn upstream(&self, branch: &str) -> Option<String> {
        let refname = format!("refs/heads/{}", branch);
        let upstream = self
            .git(&["for-each-ref", "--format=%(upstream:short)", &refname])
            .ok()?;
        (!upstream.is_empty()).then_some(upstream)
    }

    fn ahead_behind(&self, local: &str, remote: &str) -> Result<(usize, usize)> {
        let range = format!("{}...{}", local, remote);
        let output = self.git(&["rev-list", "--left-right", "--count", &range])?;
        let mut counts = output.split_whitespace().map(str::parse::<usize>);
        match (counts.next(), counts.next()) {
            (Some(Ok(ahead)), Some(Ok(behind))) => Ok((ahead, behind)),
            _ => Err(KitschError::Git(format!(
                "unexpected rev-list output {:?}",
                output
            ))),
        }
    }

    fn head(&self, max_tags_to_search: i64) -> Result<HeadInfo> {
        // On a fresh repository HEAD names a branch that has no commit yet,
        // so rev-parse fails; the branch name is still good.
        let hash = self.git(&["rev-parse", "--verify", "-q", "HEAD"]).unwrap_or_default();
        let head_ref = match self.git(&["symbolic-ref", "-q", "HEAD"]) {
            Ok(r) => r,
            Err(_) => {
                let head = self.read("HEAD");
                head.strip_prefix("ref: ").unwrap_or_default().to_string()
            }
        };
        if hash.is_empty() && head_ref.is_empty() {
            return Err(KitschError::Git("unable to resolve HEAD".to_string()));
        }

        let mut info = HeadInfo {
            description: extract_branch_name(&self.read("rebase-merge/head-name")),
            detached: true,
            hash,
            is_tag: false,
        };

        if info.description.is_empty()
            && let Some(branch) = head_ref.strip_prefix("refs/heads/")
        {
            info.description = branch.to_string();
            info.detached = false;
        }

        if info.description.is_empty()
            && let Some(tag) = self.tag_for_hash(&info.hash, max_tags_to_search)
        {
            info.description = format!("({})", tag.trim());
            info.is_tag = true;
        }

        if info.description.is_empty() && info.hash.len() > SHORT_HASH_LENGTH {
            info.description = format!("({}…)", &info.hash[..SHORT_HASH_LENGTH]);
        }

        if info.description.is_empty() {
            info.description = "???".to_string();
        }
        Ok(info)
    }

    fn state(&self) -> RepositoryState {
        let mut result = RepositoryState::default();

        if self.exists("rebase-merge") {
            result.state = if self.exists("rebase-merge/interactive") {
                StateKind::RebasingInteractive
            } else {
                StateKind::RebaseMerging
            };
            result.step = self.read("rebase-merge/msgnum");
            result.total = self.read("rebase-merge/end");
        } else if self.exists("rebase-apply") {
            result.step = self.read("rebase-apply/next");
            result.total = self.read("rebase-apply/last");
            result.state = if self.exists("rebase-apply/rebasing") {
                StateKind::Rebasing
            } else if self.exists("rebase-apply/applying") {
                StateKind::Aming
            } else {
                StateKind::RebaseAming
            };
        } else if self.exists("MERGE_HEAD") {
            result.state = StateKind::Merging;
        } else if self.exists("CHERRY_PICK_HEAD") {
            result.state = StateKind::CherryPicking;
        } else if self.exists("REVERT_HEAD") {
            result.state = StateKind::Reverting;
        } else if self.exists("BISECT_LOG") {
            result.state = StateKind::Bisecting;
        }

        result
    }

    fn stats(&self) -> Result<GitStats> {
        let mut counter = StatusCounter::new();
        stream_git(&self.git, &self.root, &["status", "-z"], &mut counter)?;
        Ok(counter.stats)
    }
}
