//! crates/logging/src/tracing_macros.rs
//! Convenience macros for subsystem tracing.
//!
//! These macros provide ergonomic wrappers around standard tracing macros
//! with the targets expected by [`VerbosityConfig`](crate::VerbosityConfig).

/// Emit a timestamp restoration trace.
///
/// # Example
/// ```ignore
/// trace_times!(path = %path.display(), "restored timestamps");
/// ```
#[macro_export]
macro_rules! trace_times {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "metarestore::times", $($arg)*);
    };
}

/// Emit an ownership change trace.
///
/// # Example
/// ```ignore
/// trace_owner!(path = %path.display(), "owner applied");
/// ```
#[macro_export]
macro_rules! trace_owner {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "metarestore::owner", $($arg)*);
    };
}

/// Emit an ACL merge trace.
///
/// # Example
/// ```ignore
/// trace_acl!(path = %path.display(), "granted full control");
/// ```
#[macro_export]
macro_rules! trace_acl {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "metarestore::acl", $($arg)*);
    };
}

/// Emit an ancestor-walk trace.
///
/// # Example
/// ```ignore
/// trace_walk!(path = %dir.display(), "already processed");
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "metarestore::walk", $($arg)*);
    };
}

/// Emit a privilege scope trace.
///
/// # Example
/// ```ignore
/// trace_privilege!(count = names.len(), "privileges enabled");
/// ```
#[macro_export]
macro_rules! trace_privilege {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "metarestore::privilege", $($arg)*);
    };
}

/// Emit a batch progress trace.
///
/// # Example
/// ```ignore
/// trace_batch!(restored = 10, failed = 1, "batch finished");
/// ```
#[macro_export]
macro_rules! trace_batch {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "metarestore::batch", $($arg)*);
    };
}
