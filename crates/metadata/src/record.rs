//! Value types describing recorded and observed file metadata.

use filetime::FileTime;
use std::path::{Path, PathBuf};

/// Recorded timestamps for one file; each field is independently optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamps {
    /// Last access time.
    pub accessed: Option<FileTime>,
    /// Last modification time.
    pub modified: Option<FileTime>,
    /// Creation time. Only written on platforms that support it.
    pub created: Option<FileTime>,
}

impl Timestamps {
    /// Timestamps with every field absent.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            accessed: None,
            modified: None,
            created: None,
        }
    }

    /// Sets the access time.
    #[must_use]
    pub const fn with_accessed(mut self, time: FileTime) -> Self {
        self.accessed = Some(time);
        self
    }

    /// Sets the modification time.
    #[must_use]
    pub const fn with_modified(mut self, time: FileTime) -> Self {
        self.modified = Some(time);
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub const fn with_created(mut self, time: FileTime) -> Self {
        self.created = Some(time);
        self
    }

    /// Returns `true` when no timestamp is recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accessed.is_none() && self.modified.is_none() && self.created.is_none()
    }
}

impl From<FileTimestamps> for Timestamps {
    fn from(observed: FileTimestamps) -> Self {
        Self {
            accessed: Some(observed.accessed),
            modified: Some(observed.modified),
            created: Some(observed.created),
        }
    }
}

/// Timestamps observed on disk.
///
/// `created` is the platform's best notion of creation: the birth time where
/// the filesystem records one, otherwise the inode change time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileTimestamps {
    /// Last access time.
    pub accessed: FileTime,
    /// Last modification time.
    pub modified: FileTime,
    /// Creation time, or inode change time when birth time is unavailable.
    pub created: FileTime,
}

/// The complete set of values handed to a platform time write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedTimes {
    /// Access time to write.
    pub accessed: FileTime,
    /// Modification time to write.
    pub modified: FileTime,
    /// Creation time to write, when recorded and supported.
    pub created: Option<FileTime>,
}

/// Metadata recorded for one path at capture time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    path: PathBuf,
    times: Timestamps,
    owner: Option<String>,
    group: Option<String>,
}

impl MetadataRecord {
    /// Creates an empty record for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Replaces the recorded timestamps.
    #[must_use]
    pub const fn with_times(mut self, times: Timestamps) -> Self {
        self.times = times;
        self
    }

    /// Records an owner identity. Empty strings mean "no owner recorded".
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = non_empty(owner.into());
        self
    }

    /// Records a group identity. Empty strings mean "no group recorded".
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = non_empty(group.into());
        self
    }

    /// Path the record applies to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded timestamps.
    #[must_use]
    pub const fn times(&self) -> &Timestamps {
        &self.times
    }

    /// Recorded owner identity, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Recorded group identity, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns `true` when an owner or group is recorded.
    #[must_use]
    pub const fn has_ownership(&self) -> bool {
        self.owner.is_some() || self.group.is_some()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
