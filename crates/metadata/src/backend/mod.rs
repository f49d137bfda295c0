//! Platform capability interface.
//!
//! # Overview
//!
//! Every native metadata primitive the restorer needs sits behind
//! [`MetadataPlatform`]. The policy modules ([`crate::times`],
//! [`crate::ownership`], [`crate::propagate`]) are written once against the
//! trait; the implementation for the build target is exported as
//! [`NativePlatform`].
//!
//! # Design
//!
//! Platforms differ in what they can express. Rather than branching on the
//! operating system inside the policy code, a platform reports
//! [`Capabilities`] and the policy consults them:
//!
//! - POSIX hosts cannot set a creation time and have no discretionary ACL
//!   step; privilege elevation is a no-op.
//! - Windows writes all three FILETIMEs, merges an access grant into the
//!   DACL after changing ownership, and must enable restore privileges.
//!
//! Principals are an associated type: numeric ids on POSIX, binary SIDs on
//! Windows. Identities only become principals through
//! [`MetadataPlatform::parse_identity`].

use crate::error::MetadataError;
use crate::identity::IdentityKind;
use crate::record::{FileTimestamps, ResolvedTimes};
use std::fmt;
use std::path::Path;

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use posix::{PosixId, PosixPlatform};
#[cfg(windows)]
pub use windows::WindowsPlatform;

/// Implementation selected for the build target.
#[cfg(unix)]
pub type NativePlatform = PosixPlatform;
/// Implementation selected for the build target.
#[cfg(windows)]
pub type NativePlatform = WindowsPlatform;

/// What a platform is able to restore.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Creation time can be written.
    pub writes_creation_time: bool,
    /// Ownership changes are followed by a DACL grant.
    pub discretionary_acl: bool,
    /// Privileges enabled around ownership changes.
    pub privileges: &'static [&'static str],
}

impl Capabilities {
    /// Capabilities of a platform with only access and modification times,
    /// plain ownership, and no privilege model.
    pub const BASIC: Self = Self {
        writes_creation_time: false,
        discretionary_acl: false,
        privileges: &[],
    };
}

/// Principal receiving the DACL grant after an ownership change.
#[derive(Debug, PartialEq, Eq)]
pub enum Grantee<'a, P> {
    /// A concrete principal, usually the new owner. The entry is not inherited.
    Principal(&'a P),
    /// The well-known creator-owner principal, inherited by children.
    CreatorOwner,
}

/// Native metadata primitives for one platform.
///
/// Implementations must be shareable across threads: a single instance is
/// used by every worker restoring a batch.
pub trait MetadataPlatform: Send + Sync {
    /// Native representation of an owner or group.
    type Principal: Clone + fmt::Debug + Eq + Send + Sync;

    /// Reports what this platform can restore.
    fn capabilities(&self) -> Capabilities;

    /// Parses a textual identity into a principal.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidOwnershipFormat`](crate::ErrorKind::InvalidOwnershipFormat)
    /// when `identity` does not denote a principal.
    fn parse_identity(&self, identity: &str) -> Result<Self::Principal, MetadataError>;

    /// Renders a principal in the textual form accepted by [`Self::parse_identity`].
    fn principal_to_string(&self, principal: &Self::Principal) -> String;

    /// Looks up the account name registered for `principal`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::DisplayNameUnavailable`](crate::ErrorKind::DisplayNameUnavailable)
    /// when no account is registered.
    fn resolve_display_name(
        &self,
        principal: &Self::Principal,
        kind: IdentityKind,
    ) -> Result<String, MetadataError>;

    /// Reads the current access, modification, and creation times.
    ///
    /// # Errors
    ///
    /// Fails when `path` cannot be inspected.
    fn read_times(&self, path: &Path) -> Result<FileTimestamps, MetadataError>;

    /// Writes `times` in one native operation.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ApplyFailed`](crate::ErrorKind::ApplyFailed) on a rejected write.
    fn write_times(&self, path: &Path, times: &ResolvedTimes) -> Result<(), MetadataError>;

    /// Reads the current owner and group of `path`.
    ///
    /// # Errors
    ///
    /// Fails when `path` cannot be inspected.
    fn read_owner_group(
        &self,
        path: &Path,
    ) -> Result<(Self::Principal, Self::Principal), MetadataError>;

    /// Changes the owner and/or group of `path`; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ApplyFailed`](crate::ErrorKind::ApplyFailed) on a rejected change.
    fn set_owner_group(
        &self,
        path: &Path,
        owner: Option<&Self::Principal>,
        group: Option<&Self::Principal>,
    ) -> Result<(), MetadataError>;

    /// Merges a full-control grant for `grantee` into the DACL of `path`.
    ///
    /// Platforms without discretionary ACLs accept and ignore the call.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ApplyFailed`](crate::ErrorKind::ApplyFailed) on a rejected merge.
    fn grant_owner_access(
        &self,
        path: &Path,
        grantee: Grantee<'_, Self::Principal>,
    ) -> Result<(), MetadataError> {
        let _ = (path, grantee);
        Ok(())
    }

    /// Enables `privileges` for the calling process.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::PrivilegeAcquisitionFailed`](crate::ErrorKind::PrivilegeAcquisitionFailed);
    /// on failure none of the privileges remain enabled by this call.
    fn enable_privileges(&self, privileges: &[&'static str]) -> Result<(), MetadataError> {
        let _ = privileges;
        Ok(())
    }

    /// Releases privileges previously enabled through [`Self::enable_privileges`].
    fn disable_privileges(&self, privileges: &[&'static str]) {
        let _ = privileges;
    }
}

/// Returns the platform implementation for the build target.
#[must_use]
pub fn native() -> NativePlatform {
    NativePlatform::default()
}
