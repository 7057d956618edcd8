//! Counting file changes from `git status -z`.

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Counts of files in the index or in the work tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStats {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl FileStats {
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    fn count(&mut self, code: u8) {
        match code {
            b'A' => self.added += 1,
            b'D' => self.deleted += 1,
            b'M' | b'R' | b'C' => self.modified += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitStats {
    pub index: FileStats,
    pub unstaged: FileStats,
    pub unmerged: usize,
}

/// A writer that parses `git status -z` output as it arrives.
///
/// Each entry is `XY <path>` terminated by NUL. Renames and copies are
/// followed by one more NUL-terminated field, the source path, which is
/// skipped.
#[derive(Debug, Default)]
pub struct StatusCounter {
    line_pos: usize,
    x: u8,
    rename_pending: bool,
    in_source: bool,
    pub stats: GitStats,
}

impl StatusCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, x: u8, y: u8) {
        let stats = &mut self.stats;
        if (x == b'D' && y == b'D') || (x == b'A' && y == b'A') || x == b'U' || y == b'U' {
            stats.unmerged += 1;
        } else if x == b'?' {
            stats.unstaged.added += 1;
        } else {
            stats.index.count(x);
            stats.unstaged.count(y);
        }
        self.rename_pending = x == b'R' || x == b'C';
    }
}

impl Write for StatusCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            if b == 0 {
                self.line_pos = 0;
                self.in_source = std::mem::take(&mut self.rename_pending);
                continue;
            }
            if self.in_source {
                continue;
            }
            match self.line_pos {
                0 => self.x = b,
                1 => {
                    let x = self.x;
                    self.entry(x, b);
                }
                _ => {}
            }
            self.line_pos += 1;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(chunks: &[&[u8]]) -> GitStats {
        let mut counter = StatusCounter::new();
        for chunk in chunks {
            counter.write_all(chunk).unwrap();
        }
        counter.stats
    }

    #[test]
    fn test_counts_index_and_work_tree() {
        let stats = count(&[b"M  a.txt\0 M b.txt\0A  c.txt\0 D d.txt\0?? e.txt\0"]);
        assert_eq!(
            stats.index,
            FileStats {
                added: 1,
                modified: 1,
                deleted: 0
            }
        );
        assert_eq!(
            stats.unstaged,
            FileStats {
                added: 1,
                modified: 1,
                deleted: 1
            }
        );
        assert_eq!(stats.unmerged, 0);
    }

    #[test]
    fn test_unmerged() {
        let stats = count(&[b"UU a\0AA b\0DD c\0"]);
        assert_eq!(stats.unmerged, 3);
        assert_eq!(stats.index.total(), 0);
    }

    #[test]
    fn test_entries_split_across_writes() {
        let stats = count(&[b"M", b"M a.t", b"xt\0", b"?", b"? b\0"]);
        assert_eq!(stats.index.modified, 1);
        assert_eq!(stats.unstaged.modified, 1);
        assert_eq!(stats.unstaged.added, 1);
    }

    #[test]
    fn test_rename_source_path_is_skipped() {
        let stats = count(&[b"R  new.txt\0MM-old.txt\0 M other\0"]);
        assert_eq!(stats.index.modified, 1);
        assert_eq!(stats.unstaged.modified, 1);
    }
}
