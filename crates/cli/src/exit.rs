//! Process exit statuses.

use std::fmt;

/// Exit statuses reported by the `metarestore` binary.
///
/// The partial-failure code matches rsync's "partial transfer" status so
/// scripts wrapping both tools can share their handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Every requested record was handled.
    Success,
    /// Invalid arguments, configuration, or an unreadable manifest.
    Usage,
    /// At least one record could not be restored or captured.
    Partial,
}

impl ExitStatus {
    /// Numeric process exit code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Usage => 1,
            Self::Partial => 23,
        }
    }

    /// Short description used in diagnostics.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "syntax or usage error",
            Self::Partial => "some records were not restored",
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.as_i32())
    }
}

impl From<ExitStatus> for i32 {
    fn from(status: ExitStatus) -> Self {
        status.as_i32()
    }
}
