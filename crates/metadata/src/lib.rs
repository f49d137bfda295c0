#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` restores filesystem metadata recorded alongside synchronised
//! files: access, modification, and creation times, owner and group, and on
//! Windows a DACL grant that keeps restored trees reachable.
//!
//! # Design
//!
//! - [`MetadataPlatform`] is the one seam to the operating system. The
//!   policy code in [`times`], [`ownership`], and [`propagate`] is written
//!   against it once; [`NativePlatform`] picks the implementation for the
//!   build target.
//! - [`propagate::PropagationCoordinator`] applies ownership to a path and
//!   each ancestor directory, guarded by a process-wide
//!   [`propagate::ProcessedPaths`] set so shared ancestors are touched once.
//! - [`privilege::PrivilegeScope`] brackets ownership changes with the
//!   privileges the platform requires.
//! - [`RestoreSession`] ties these together for single records and batches.
//!
//! # Invariants
//!
//! - Absent fields are never written; the Unix epoch is a real timestamp.
//! - Access and modification time are written together in one native call.
//! - A path is handed to the ownership applier at most once per coordinator.
//!
//! # Errors
//!
//! Every fallible operation returns [`MetadataError`], whose
//! [`ErrorKind`] tells callers whether to skip the record, retry, or abort.
//!
//! # Examples
//!
//! ```no_run
//! use filetime::FileTime;
//! use metadata::{MetadataRecord, RestoreOptions, RestoreSession, Timestamps};
//!
//! let session = RestoreSession::native(RestoreOptions::default());
//! let record = MetadataRecord::new("dest/report.pdf")
//!     .with_times(Timestamps::none().with_modified(FileTime::from_unix_time(1_700_000_000, 0)))
//!     .with_owner("1000");
//! session.restore(&record)?;
//! # Ok::<(), metadata::MetadataError>(())
//! ```

pub mod attributes;
mod backend;
mod error;
pub mod filetime_ticks;
pub mod identity;
mod options;
pub mod ownership;
pub mod privilege;
pub mod propagate;
mod record;
mod session;
pub mod times;

#[cfg(unix)]
pub use backend::{PosixId, PosixPlatform};
#[cfg(windows)]
pub use backend::WindowsPlatform;
pub use backend::{Capabilities, Grantee, MetadataPlatform, NativePlatform, native};
pub use error::{Axis, ErrorKind, MetadataError};
pub use identity::IdentityKind;
pub use options::RestoreOptions;
pub use ownership::{AclGrant, ParseAclGrantError, apply_ownership};
pub use privilege::{PrivilegeScope, with_elevated_privileges};
pub use propagate::{ProcessedPaths, PropagationCoordinator, PropagationStats};
pub use record::{FileTimestamps, MetadataRecord, ResolvedTimes, Timestamps};
pub use session::{BatchReport, RestoreOutcome, RestoreSession};
