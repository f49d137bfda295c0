//! Identity translation between recorded strings and platform principals.
//!
//! Recorded owners and groups are plain strings: decimal ids on POSIX, SID
//! strings or account names on Windows. Nothing else in the crate parses
//! them; everything goes through [`parse_identity`] so the accepted formats
//! are defined in exactly one place per platform.

use crate::backend::MetadataPlatform;
use crate::error::MetadataError;
use std::fmt;

/// Which account database an identity belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// A user account.
    Owner,
    /// A group account.
    Group,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "user",
            Self::Group => "group",
        })
    }
}

/// Parses `identity` into a principal of `platform`.
///
/// # Errors
///
/// Fails with [`ErrorKind::InvalidOwnershipFormat`](crate::ErrorKind::InvalidOwnershipFormat)
/// when `identity` is not valid on this platform.
pub fn parse_identity<P: MetadataPlatform>(
    platform: &P,
    identity: &str,
) -> Result<P::Principal, MetadataError> {
    platform.parse_identity(identity)
}

/// Renders `principal` in the form [`parse_identity`] accepts.
pub fn principal_to_string<P: MetadataPlatform>(platform: &P, principal: &P::Principal) -> String {
    platform.principal_to_string(principal)
}

/// Resolves the account name registered for `identity`.
///
/// # Errors
///
/// Fails with `InvalidOwnershipFormat` when `identity` does not parse, and
/// with [`ErrorKind::DisplayNameUnavailable`](crate::ErrorKind::DisplayNameUnavailable)
/// when it parses but no account is registered for it.
pub fn resolve_display_name<P: MetadataPlatform>(
    platform: &P,
    identity: &str,
    kind: IdentityKind,
) -> Result<String, MetadataError> {
    let principal = platform.parse_identity(identity)?;
    platform.resolve_display_name(&principal, kind)
}

/// Translates an optional owner/group pair, treating empty strings as absent.
///
/// Both identities are parsed before either is used, so a malformed group
/// never leaves a half-applied owner behind.
///
/// # Errors
///
/// Returns the first translation failure.
pub fn translate_pair<P: MetadataPlatform>(
    platform: &P,
    owner: Option<&str>,
    group: Option<&str>,
) -> Result<(Option<P::Principal>, Option<P::Principal>), MetadataError> {
    let translate = |identity: Option<&str>| {
        identity
            .filter(|identity| !identity.is_empty())
            .map(|identity| platform.parse_identity(identity))
            .transpose()
    };
    Ok((translate(owner)?, translate(group)?))
}
