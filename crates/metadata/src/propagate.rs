//! Ownership propagation to a path and its ancestor directories.
//!
//! # Overview
//!
//! Restoring a file's owner also restores the owner of every directory above
//! it, so a tree materialised by a privileged process ends up owned the way it
//! was recorded. Many files share ancestors; [`ProcessedPaths`] makes sure each
//! distinct path is handed to the applier at most once for the lifetime of the
//! coordinator, no matter how many records or threads reach it.
//!
//! # Design
//!
//! The dedup gate is a mutex around an `FxHashSet`. Checking and recording a
//! path happen in one critical section ([`ProcessedPaths::claim`]); the native
//! ownership calls run after the lock is released so slow security APIs never
//! serialise unrelated paths. A claimed path whose application fails stays
//! claimed: later records do not retry it.
//!
//! The walk stops before the filesystem root, the empty path, the `.` and
//! `..` markers, and an optional boundary directory. Paths are compared after
//! lexical normalisation, so `a/./b`, `a/x/../b` and `a/b` share one entry.
//!
//! # Examples
//!
//! ```
//! use metadata::propagate::ancestors;
//! use std::path::Path;
//!
//! let walked: Vec<_> = ancestors(Path::new("/a/b/c.txt"), None).collect();
//! assert_eq!(walked, [Path::new("/a/b"), Path::new("/a")]);
//! ```

use crate::backend::MetadataPlatform;
use crate::error::MetadataError;
use crate::identity::translate_pair;
use crate::ownership::{AclGrant, apply_ownership};
use crate::privilege::with_elevated_privileges;
use logging::trace_walk;
use rustc_hash::FxHashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Set of paths whose ownership has already been handled.
#[derive(Debug, Default)]
pub struct ProcessedPaths {
    paths: Mutex<FxHashSet<PathBuf>>,
}

impl ProcessedPaths {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The set only grows, so a poisoned lock still holds a usable set.
    fn lock(&self) -> MutexGuard<'_, FxHashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `path`, returning `true` if this call is the first to do so.
    pub fn claim(&self, path: &Path) -> bool {
        let mut paths = self.lock();
        if paths.contains(path) {
            return false;
        }
        paths.insert(path.to_path_buf())
    }

    /// Returns `true` when `path` has been claimed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    /// Number of claimed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing has been claimed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claimed paths in sorted order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().iter().cloned().collect();
        paths.sort();
        paths
    }
}

/// Counters for one propagation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Paths handed to the applier.
    pub applied: usize,
    /// Paths skipped because they were already claimed.
    pub skipped: usize,
}

impl PropagationStats {
    /// Adds `other` into `self`.
    pub const fn absorb(&mut self, other: Self) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Applies ownership to paths and their ancestors, each at most once.
#[derive(Debug)]
pub struct PropagationCoordinator {
    processed: ProcessedPaths,
    grant: AclGrant,
    ancestors: bool,
    boundary: Option<PathBuf>,
}

impl Default for PropagationCoordinator {
    fn default() -> Self {
        Self::new(AclGrant::default())
    }
}

impl PropagationCoordinator {
    /// Creates a coordinator that walks ancestors and applies `grant`.
    #[must_use]
    pub fn new(grant: AclGrant) -> Self {
        Self {
            processed: ProcessedPaths::new(),
            grant,
            ancestors: true,
            boundary: None,
        }
    }

    /// Enables or disables the ancestor walk.
    #[must_use]
    pub const fn with_ancestors(mut self, ancestors: bool) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Stops the ancestor walk before reaching `boundary`.
    #[must_use]
    pub fn with_boundary(mut self, boundary: Option<&Path>) -> Self {
        self.boundary = boundary.map(normalize);
        self
    }

    /// Paths handled so far.
    #[must_use]
    pub const fn processed(&self) -> &ProcessedPaths {
        &self.processed
    }

    /// Grant applied after each ownership change.
    #[must_use]
    pub const fn grant(&self) -> AclGrant {
        self.grant
    }

    /// Translates `owner`/`group` and applies them to `path` and its ancestors.
    ///
    /// Empty or absent identities are left unchanged; when both are absent
    /// nothing happens. Both identities are translated before any path is
    /// touched.
    ///
    /// # Errors
    ///
    /// Translation, privilege, and application failures, the latter stopping
    /// the walk at the failing path.
    pub fn propagate<P: MetadataPlatform>(
        &self,
        platform: &P,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> Result<PropagationStats, MetadataError> {
        let (owner, group) =
            translate_pair(platform, owner, group).map_err(|error| error.with_path(path))?;
        self.propagate_principals(platform, path, owner.as_ref(), group.as_ref())
    }

    /// Applies already translated principals to `path` and its ancestors.
    ///
    /// # Errors
    ///
    /// As for [`Self::propagate`], minus translation.
    pub fn propagate_principals<P: MetadataPlatform>(
        &self,
        platform: &P,
        path: &Path,
        owner: Option<&P::Principal>,
        group: Option<&P::Principal>,
    ) -> Result<PropagationStats, MetadataError> {
        if owner.is_none() && group.is_none() {
            return Ok(PropagationStats::default());
        }

        with_elevated_privileges(platform, || {
            let target = normalize(path);
            let mut stats = PropagationStats::default();
            self.apply_once(platform, &target, owner, group, &mut stats)?;
            if self.ancestors {
                for directory in ancestors(&target, self.boundary.as_deref()) {
                    self.apply_once(platform, directory, owner, group, &mut stats)?;
                }
            }
            Ok(stats)
        })
    }

    fn apply_once<P: MetadataPlatform>(
        &self,
        platform: &P,
        path: &Path,
        owner: Option<&P::Principal>,
        group: Option<&P::Principal>,
        stats: &mut PropagationStats,
    ) -> Result<(), MetadataError> {
        if !self.processed.claim(path) {
            stats.skipped += 1;
            trace_walk!(path = %path.display(), "already processed");
            return Ok(());
        }
        stats.applied += 1;
        trace_walk!(path = %path.display(), "applying ownership");
        apply_ownership(platform, path, owner, group, self.grant)
    }
}

/// Ancestors of `path` visited by the walk, nearest first.
///
/// Stops before the filesystem root, the empty path, `.`, `..`, and
/// `boundary`. Expects a path already passed through [`normalize`].
pub fn ancestors<'a>(path: &'a Path, boundary: Option<&'a Path>) -> impl Iterator<Item = &'a Path> {
    path.ancestors()
        .skip(1)
        .take_while(move |directory| !is_walk_end(directory) && Some(*directory) != boundary)
}

fn is_walk_end(directory: &Path) -> bool {
    directory.as_os_str().is_empty()
        || directory == Path::new(".")
        || directory.ends_with("..")
        || directory.parent().is_none()
}

/// Lexically normalises `path`.
///
/// Drops `.` components after the first and redundant separators. A `..`
/// removes the preceding normal component; at the filesystem root it is
/// dropped, and in a relative path with nothing left to remove it is kept.
/// Symlinks are not consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for (index, component) in path.components().enumerate() {
        match component {
            Component::CurDir if index > 0 => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) => {}
                _ => normalized.push(Component::ParentDir.as_os_str()),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
