//! Shared helpers for tests across the workspace.
//!
//! - [`TestTree`] lays out files and directories under a temporary root.
//! - [`CallCounter`] records how often each path reached an operation, safe
//!   to share between threads.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A temporary directory populated with files.
///
/// Entries ending in `/` are created as directories; everything else is an
/// empty file, with parent directories created as needed.
pub struct TestTree {
    root: TempDir,
}

impl TestTree {
    /// Creates a tree containing `entries`, relative to a fresh temporary root.
    ///
    /// # Errors
    ///
    /// Propagates directory and file creation failures.
    pub fn new(entries: &[&str]) -> io::Result<Self> {
        let root = tempfile::tempdir()?;
        for entry in entries {
            let path = root.path().join(entry.trim_end_matches('/'));
            if entry.ends_with('/') {
                fs::create_dir_all(&path)?;
            } else {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, b"")?;
            }
        }
        Ok(Self { root })
    }

    /// Root of the tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }
}

/// Thread-safe per-path call counts.
#[derive(Debug, Default)]
pub struct CallCounter {
    counts: Mutex<BTreeMap<PathBuf, usize>>,
}

impl CallCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one call for `path`.
    pub fn record(&self, path: &Path) {
        *self
            .counts
            .lock()
            .expect("call counter mutex poisoned")
            .entry(path.to_path_buf())
            .or_default() += 1;
    }

    /// Calls recorded for `path`.
    #[must_use]
    pub fn count(&self, path: impl AsRef<Path>) -> usize {
        self.counts
            .lock()
            .expect("call counter mutex poisoned")
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Calls recorded across all paths.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts
            .lock()
            .expect("call counter mutex poisoned")
            .values()
            .sum()
    }

    /// All counts, ordered by path.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PathBuf, usize)> {
        self.counts
            .lock()
            .expect("call counter mutex poisoned")
            .iter()
            .map(|(path, count)| (path.clone(), *count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_creates_files_and_directories() {
        let tree = TestTree::new(&["a/b/c.txt", "empty/"]).expect("tree");
        assert!(tree.path("a/b/c.txt").is_file());
        assert!(tree.path("empty").is_dir());
    }

    #[test]
    fn counter_tracks_paths_independently() {
        let counter = CallCounter::new();
        counter.record(Path::new("/a"));
        counter.record(Path::new("/a"));
        counter.record(Path::new("/b"));
        assert_eq!(counter.count("/a"), 2);
        assert_eq!(counter.count("/c"), 0);
        assert_eq!(counter.total(), 3);
        assert_eq!(counter.snapshot().len(), 2);
    }
}
