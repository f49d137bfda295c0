use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised by a native platform call.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Looking up an account in the user or group database failed.
    #[error("account lookup for '{subject}' failed: {source}")]
    AccountLookup {
        /// The id or name being resolved.
        subject: String,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// The string is not a well-formed security identifier.
    #[error("'{subject}' is not a well-formed security identifier: {source}")]
    InvalidSid {
        /// The rejected string.
        subject: String,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// A process privilege could not be enabled.
    #[error("unable to enable privilege {name}: {source}")]
    Privilege {
        /// Name of the privilege, e.g. `SeRestorePrivilege`.
        name: String,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// Reading or writing a security descriptor failed.
    #[error("{operation} failed for '{}': {source}", path.display())]
    Security {
        /// The step that failed.
        operation: &'static str,
        /// Object whose descriptor was accessed.
        path: PathBuf,
        /// Underlying operating-system error.
        #[source]
        source: io::Error,
    },
}

impl PlatformError {
    /// Consumes the error and returns the operating-system error behind it.
    #[must_use]
    pub fn into_io_error(self) -> io::Error {
        match self {
            Self::AccountLookup { source, .. }
            | Self::InvalidSid { source, .. }
            | Self::Privilege { source, .. }
            | Self::Security { source, .. } => source,
        }
    }
}
