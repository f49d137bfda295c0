use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The metadata axis a failed write was touching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Access, modification, or creation time.
    Times,
    /// Owner or group.
    Owner,
    /// Discretionary access-control list.
    Acl,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Times => "times",
            Self::Owner => "owner",
            Self::Acl => "acl",
        })
    }
}

/// Classification of a [`MetadataError`] so callers can choose between
/// retrying, skipping the record, or aborting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path does not exist or could not be inspected.
    NotFound,
    /// An owner or group string is not a valid identity on this platform.
    InvalidOwnershipFormat,
    /// A recorded timestamp attribute could not be parsed.
    InvalidTimestamp,
    /// The process could not acquire the privileges needed to change ownership.
    PrivilegeAcquisitionFailed,
    /// A native write failed on the given axis.
    ApplyFailed(Axis),
    /// A valid identity has no account name registered.
    DisplayNameUnavailable,
    /// A record path resolves outside the destination directory.
    OutsideRoot,
    /// Any other I/O failure while reading metadata.
    Io,
}

/// Error produced when metadata restoration fails.
#[derive(Debug)]
pub struct MetadataError {
    kind: ErrorKind,
    context: &'static str,
    path: PathBuf,
    source: io::Error,
}

impl MetadataError {
    /// Creates a new [`MetadataError`] from its parts.
    ///
    /// Platform implementations use this to report failures; pass an empty
    /// path when no path is involved.
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        context: &'static str,
        path: &Path,
        source: io::Error,
    ) -> Self {
        Self {
            kind,
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classifies a failed read: missing paths become [`ErrorKind::NotFound`].
    pub(crate) fn read(context: &'static str, path: &Path, source: io::Error) -> Self {
        let kind = if source.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Self::new(kind, context, path, source)
    }

    /// Classifies a failed write on `axis`; missing paths stay [`ErrorKind::NotFound`].
    pub(crate) fn apply(axis: Axis, context: &'static str, path: &Path, source: io::Error) -> Self {
        let kind = if source.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::ApplyFailed(axis)
        };
        Self::new(kind, context, path, source)
    }

    /// An identity string that could not be translated.
    pub(crate) fn invalid_identity(context: &'static str, source: io::Error) -> Self {
        Self::new(ErrorKind::InvalidOwnershipFormat, context, Path::new(""), source)
    }

    /// A timestamp attribute that could not be parsed.
    pub(crate) fn invalid_timestamp(key: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidTimestamp,
            "parse timestamp attribute",
            Path::new(""),
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{key}='{value}': {reason}"),
            ),
        )
    }

    /// A record path that leaves the destination directory `root`.
    pub(crate) fn outside_root(path: &Path, root: &Path) -> Self {
        Self::new(
            ErrorKind::OutsideRoot,
            "resolve record path",
            path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes destination '{}'", root.display()),
            ),
        )
    }

    /// Attaches `path` to an error raised before the path was known.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        if self.path.as_os_str().is_empty() {
            self.path = path.to_path_buf();
        }
        self
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the operation being performed when the error occurred.
    #[must_use]
    pub const fn context(&self) -> &'static str {
        self.context
    }

    /// Returns the path involved in the failing operation.
    ///
    /// Empty for identity and timestamp parsing failures raised outside a
    /// restore call.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying [`io::Error`] that triggered this failure.
    #[must_use]
    pub fn source_error(&self) -> &io::Error {
        &self.source
    }

    /// Reports whether retrying the same record later could succeed.
    ///
    /// Only transient I/O conditions qualify; malformed identities, missing
    /// paths, and missing privileges fail the same way every time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Io | ErrorKind::ApplyFailed(_) => matches!(
                self.source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Consumes the error and returns its constituent parts.
    #[must_use]
    pub fn into_parts(self) -> (ErrorKind, &'static str, PathBuf, io::Error) {
        (self.kind, self.context, self.path, self.source)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.as_os_str().is_empty() {
            write!(f, "failed to {}: {}", self.context, self.source)
        } else {
            write!(
                f,
                "failed to {} '{}': {}",
                self.context,
                self.path.display(),
                self.source
            )
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
