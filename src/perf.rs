//! Timing of module execution, printed by `prompt --perf`.

use std::fmt;
use std::time::Duration;

/// How long one module took, and how long each of its children took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Performance {
    pub name: String,
    pub duration: Duration,
    pub children: Vec<Performance>,
}

impl Performance {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Performance {
            name: name.into(),
            duration,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Performance>) -> Self {
        self.children = children;
        self
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{}: {:.1?}",
            "",
            self.name,
            self.duration,
            indent = depth * 2
        )?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

/// One line per module, children indented under their parent.
impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree() {
        let perf = Performance::new("block", Duration::from_millis(12)).with_children(vec![
            Performance::new("directory", Duration::from_millis(2)),
            Performance::new("git_status", Duration::from_millis(10)),
        ]);
        let out = perf.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "block: 12.0ms");
        assert_eq!(lines[1], "  directory: 2.0ms");
        assert_eq!(lines[2], "  git_status: 10.0ms");
    }
}
