use crate::error::MetadataError;
use crate::ownership::AclGrant;
use crate::propagate::normalize;
use std::path::{Path, PathBuf};

/// Options that control which metadata a [`RestoreSession`](crate::RestoreSession) restores.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RestoreOptions {
    restore_times: bool,
    restore_ownership: bool,
    propagate_ancestors: bool,
    acl_grant: AclGrant,
    root: Option<PathBuf>,
}

impl RestoreOptions {
    /// Creates a new [`RestoreOptions`] value with defaults applied.
    ///
    /// By default timestamps and ownership are both restored, ownership
    /// propagates to ancestor directories, and the creator-owner grant is
    /// applied where the platform has discretionary ACLs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            restore_times: true,
            restore_ownership: true,
            propagate_ancestors: true,
            acl_grant: AclGrant::CreatorOwner,
            root: None,
        }
    }

    /// Requests that recorded timestamps be restored.
    #[must_use]
    #[doc(alias = "--no-times")]
    pub const fn restore_times(mut self, restore: bool) -> Self {
        self.restore_times = restore;
        self
    }

    /// Requests that recorded owners and groups be restored.
    #[must_use]
    #[doc(alias = "--no-owner")]
    pub const fn restore_ownership(mut self, restore: bool) -> Self {
        self.restore_ownership = restore;
        self
    }

    /// Requests that ownership also be applied to ancestor directories.
    #[must_use]
    #[doc(alias = "--no-ancestors")]
    pub const fn propagate_ancestors(mut self, propagate: bool) -> Self {
        self.propagate_ancestors = propagate;
        self
    }

    /// Selects the DACL grant applied after ownership changes.
    #[must_use]
    #[doc(alias = "--acl-grant")]
    pub const fn acl_grant(mut self, grant: AclGrant) -> Self {
        self.acl_grant = grant;
        self
    }

    /// Sets the destination directory.
    ///
    /// Relative record paths are resolved against it, every record must stay
    /// inside it, and the ancestor walk stops before reaching it.
    #[must_use]
    #[doc(alias = "--root")]
    pub fn root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    /// Reports whether timestamps are restored.
    #[must_use]
    pub const fn times(&self) -> bool {
        self.restore_times
    }

    /// Reports whether ownership is restored.
    #[must_use]
    pub const fn ownership(&self) -> bool {
        self.restore_ownership
    }

    /// Reports whether ownership propagates to ancestors.
    #[must_use]
    pub const fn ancestors(&self) -> bool {
        self.propagate_ancestors
    }

    /// Returns the configured DACL grant.
    #[must_use]
    pub const fn grant(&self) -> AclGrant {
        self.acl_grant
    }

    /// Returns the destination directory, if any.
    #[must_use]
    pub fn root_dir(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolves a record path against the destination directory and
    /// normalises it lexically.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::OutsideRoot`](crate::ErrorKind::OutsideRoot)
    /// when a destination is set and the normalised path is not inside it,
    /// whether through `..` components or an absolute path elsewhere.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, MetadataError> {
        let Some(root) = &self.root else {
            return Ok(normalize(path));
        };
        let root = normalize(root);
        let resolved = normalize(&root.join(path));
        if resolved.starts_with(&root) {
            Ok(resolved)
        } else {
            Err(MetadataError::outside_root(path, &root))
        }
    }
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self::new()
    }
}
