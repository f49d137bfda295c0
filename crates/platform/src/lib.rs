#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `platform` isolates the operating-system specific code used by the
//! metadata restoration core. Everything that has to talk to a native account
//! database, a security descriptor, or a process token lives here so the
//! `metadata` crate can stay free of FFI.
//!
//! # Design
//!
//! - [`accounts`] resolves numeric POSIX ids to account names through the
//!   system user and group databases.
//! - [`privilege`] reference-counts process privileges so overlapping
//!   elevation scopes only drop a privilege after the last holder releases it.
//! - `sid` and `security` (Windows only) wrap security identifiers and the
//!   named-object security APIs (`GetNamedSecurityInfoW`,
//!   `SetNamedSecurityInfoW`, `SetEntriesInAclW`).
//!
//! # Errors
//!
//! Fallible operations return [`PlatformError`], which always carries the
//! underlying [`std::io::Error`] produced by the operating system.

mod error;

pub mod accounts;
pub mod privilege;

#[cfg(windows)]
pub mod security;
#[cfg(windows)]
pub mod sid;

pub use error::PlatformError;
