//! Memoizing wrapper around a [`Git`] implementation.
//!
//! Assumes the repository does not change while a prompt renders, so each
//! question is answered at most once. Every memo has its own lock, so a slow
//! `status` does not hold up a module that only wants HEAD.

use super::{Git, GitStats, HeadInfo, RepositoryState};
use crate::error::Result;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// Tag searches are bounded; a negative bound means "all tags".
fn searched_enough(searched: i64, wanted: i64) -> bool {
    searched < 0 || (wanted >= 0 && wanted <= searched)
}

pub struct CachingGit {
    inner: Box<dyn Git>,
    stash_count: Mutex<Option<usize>>,
    upstream: Mutex<Option<(String, Option<String>)>>,
    ahead_behind: Mutex<Option<(String, String, (usize, usize))>>,
    head: Mutex<Option<(i64, HeadInfo)>>,
    state: Mutex<Option<RepositoryState>>,
    stats: Mutex<Option<GitStats>>,
}

impl CachingGit {
    pub fn new(inner: Box<dyn Git>) -> Self {
        Self {
            inner,
            stash_count: Mutex::new(None),
            upstream: Mutex::new(None),
            ahead_behind: Mutex::new(None),
            head: Mutex::new(None),
            state: Mutex::new(None),
            stats: Mutex::new(None),
        }
    }
}

impl Git for CachingGit {
    fn repo_root(&self) -> &Path {
        self.inner.repo_root()
    }

    fn stash_count(&self) -> Result<usize> {
        let mut memo = lock(&self.stash_count);
        if let Some(count) = *memo {
            return Ok(count);
        }
        let count = self.inner.stash_count()?;
        *memo = Some(count);
        Ok(count)
    }

    fn upstream(&self, branch: &str) -> Option<String> {
        let mut memo = lock(&self.upstream);
        if let Some((cached_branch, upstream)) = memo.as_ref()
            && cached_branch == branch
        {
            return upstream.clone();
        }
        let upstream = self.inner.upstream(branch);
        *memo = Some((branch.to_string(), upstream.clone()));
        upstream
    }

    fn ahead_behind(&self, local: &str, remote: &str) -> Result<(usize, usize)> {
        let mut memo = lock(&self.ahead_behind);
        if let Some((l, r, counts)) = memo.as_ref()
            && l == local
            && r == remote
        {
            return Ok(*counts);
        }
        let counts = self.inner.ahead_behind(local, remote)?;
        *memo = Some((local.to_string(), remote.to_string(), counts));
        Ok(counts)
    }

    fn head(&self, max_tags_to_search: i64) -> Result<HeadInfo> {
        let mut memo = lock(&self.head);
        if let Some((searched, head)) = memo.as_ref() {
            // A branch or a found tag won't change with a wider search.
            if !head.detached || head.is_tag || searched_enough(*searched, max_tags_to_search) {
                return Ok(head.clone());
            }
        }
        let head = self.inner.head(max_tags_to_search)?;
        *memo = Some((max_tags_to_search, head.clone()));
        Ok(head)
    }

    fn state(&self) -> RepositoryState {
        lock(&self.state)
            .get_or_insert_with(|| self.inner.state())
            .clone()
    }

    fn stats(&self) -> Result<GitStats> {
        let mut memo = lock(&self.stats);
        if let Some(stats) = *memo {
            return Ok(stats);
        }
        let stats = self.inner.stats()?;
        *memo = Some(stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::DemoGit;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often the wrapped implementation is asked for HEAD.
    struct Counting {
        demo: DemoGit,
        head_calls: Arc<AtomicUsize>,
    }

    impl Git for Counting {
        fn repo_root(&self) -> &Path {
            self.demo.repo_root()
        }
        fn stash_count(&self) -> Result<usize> {
            self.demo.stash_count()
        }
        fn upstream(&self, branch: &str) -> Option<String> {
            self.demo.upstream(branch)
        }
        fn ahead_behind(&self, local: &str, remote: &str) -> Result<(usize, usize)> {
            self.demo.ahead_behind(local, remote)
        }
        fn head(&self, max_tags_to_search: i64) -> Result<HeadInfo> {
            self.head_calls.fetch_add(1, Ordering::SeqCst);
            self.demo.head(max_tags_to_search)
        }
        fn state(&self) -> RepositoryState {
            self.demo.state()
        }
        fn stats(&self) -> Result<GitStats> {
            self.demo.stats()
        }
    }

    fn caching(demo: DemoGit) -> (CachingGit, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let git = CachingGit::new(Box::new(Counting {
            demo,
            head_calls: calls.clone(),
        }));
        (git, calls)
    }

    #[test]
    fn test_branch_head_is_fetched_once() {
        let (git, calls) = caching(DemoGit {
            head: "main".to_string(),
            ..DemoGit::default()
        });
        assert_eq!(git.head(0).unwrap().description, "main");
        assert_eq!(git.head(200).unwrap().description, "main");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_head_is_refetched_for_a_wider_tag_search() {
        let (git, calls) = caching(DemoGit {
            head: "0123456789012345678901234567890123456789".to_string(),
            is_detached: true,
            ..DemoGit::default()
        });
        git.head(0).unwrap();
        git.head(0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        git.head(200).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        git.head(10).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_searched_enough() {
        assert!(searched_enough(-1, 500));
        assert!(searched_enough(200, 10));
        assert!(!searched_enough(0, 1));
        assert!(!searched_enough(200, -1));
    }
}
