//! Ownership and DACL application for a single path.

use crate::backend::{Grantee, MetadataPlatform};
use crate::error::MetadataError;
use logging::{trace_acl, trace_owner};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Principal granted full control after an ownership change on platforms
/// with discretionary ACLs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AclGrant {
    /// Leave the DACL untouched.
    None,
    /// Grant the new owner full control on the path itself.
    Owner,
    /// Grant the creator-owner principal inheritable full control.
    #[default]
    CreatorOwner,
}

impl AclGrant {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::None, Self::Owner, Self::CreatorOwner];

    /// The configuration spelling of this grant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Owner => "owner",
            Self::CreatorOwner => "creator-owner",
        }
    }
}

impl fmt::Display for AclGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`AclGrant`] spelling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAclGrantError(String);

impl fmt::Display for ParseAclGrantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown ACL grant '{}' (expected none, owner, or creator-owner)",
            self.0
        )
    }
}

impl std::error::Error for ParseAclGrantError {}

impl FromStr for AclGrant {
    type Err = ParseAclGrantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|grant| grant.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseAclGrantError(value.to_owned()))
    }
}

/// Applies `owner`/`group` to `path` and, where supported, the DACL grant.
///
/// Absent fields are left unchanged; with both absent nothing is touched.
/// A DACL failure after a successful ownership change is reported without
/// rolling the ownership back.
///
/// # Errors
///
/// [`ErrorKind::ApplyFailed`](crate::ErrorKind::ApplyFailed) with
/// [`Axis::Owner`](crate::Axis::Owner) or [`Axis::Acl`](crate::Axis::Acl),
/// or [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) for a missing path.
pub fn apply_ownership<P: MetadataPlatform>(
    platform: &P,
    path: &Path,
    owner: Option<&P::Principal>,
    group: Option<&P::Principal>,
    grant: AclGrant,
) -> Result<(), MetadataError> {
    if owner.is_none() && group.is_none() {
        return Ok(());
    }

    platform.set_owner_group(path, owner, group)?;
    trace_owner!(
        path = %path.display(),
        owner = ?owner.map(|p| platform.principal_to_string(p)),
        group = ?group.map(|p| platform.principal_to_string(p)),
        "ownership applied"
    );

    if !platform.capabilities().discretionary_acl {
        return Ok(());
    }
    let grantee = match (grant, owner) {
        (AclGrant::None, _) | (AclGrant::Owner, None) => return Ok(()),
        (AclGrant::Owner, Some(owner)) => Grantee::Principal(owner),
        (AclGrant::CreatorOwner, _) => Grantee::CreatorOwner,
    };
    platform.grant_owner_access(path, grantee)?;
    trace_acl!(path = %path.display(), grant = %grant, "granted full control");
    Ok(())
}
