//! Scoped privilege elevation.
//!
//! A [`PrivilegeScope`] enables the platform's ownership privileges on
//! creation and releases them when dropped, including on early return and
//! unwinding. Platforms without a privilege model report an empty privilege
//! list and the scope performs no calls at all.

use crate::backend::MetadataPlatform;
use crate::error::MetadataError;
use logging::trace_privilege;

/// RAII guard holding elevated privileges for its lifetime.
#[must_use = "privileges are released as soon as the scope is dropped"]
pub struct PrivilegeScope<'a, P: MetadataPlatform + ?Sized> {
    platform: &'a P,
    privileges: &'static [&'static str],
}

impl<'a, P: MetadataPlatform + ?Sized> PrivilegeScope<'a, P> {
    /// Enables the privileges `platform` needs for ownership changes.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::PrivilegeAcquisitionFailed`](crate::ErrorKind::PrivilegeAcquisitionFailed)
    /// when any privilege cannot be enabled; nothing stays enabled.
    pub fn acquire(platform: &'a P) -> Result<Self, MetadataError> {
        Self::acquire_with(platform, platform.capabilities().privileges)
    }

    /// Enables an explicit privilege list.
    ///
    /// # Errors
    ///
    /// As for [`Self::acquire`].
    pub fn acquire_with(
        platform: &'a P,
        privileges: &'static [&'static str],
    ) -> Result<Self, MetadataError> {
        if !privileges.is_empty() {
            platform.enable_privileges(privileges)?;
            trace_privilege!(privileges = ?privileges, "privileges enabled");
        }
        Ok(Self {
            platform,
            privileges,
        })
    }

    /// Privileges held by this scope.
    #[must_use]
    pub const fn privileges(&self) -> &'static [&'static str] {
        self.privileges
    }
}

impl<P: MetadataPlatform + ?Sized> Drop for PrivilegeScope<'_, P> {
    fn drop(&mut self) {
        if !self.privileges.is_empty() {
            self.platform.disable_privileges(self.privileges);
            trace_privilege!(privileges = ?self.privileges, "privileges released");
        }
    }
}

/// Runs `body` with the ownership privileges of `platform` enabled.
///
/// The body is not run when acquisition fails.
///
/// # Errors
///
/// Returns the acquisition failure or the body's own error.
pub fn with_elevated_privileges<P, T, F>(platform: &P, body: F) -> Result<T, MetadataError>
where
    P: MetadataPlatform + ?Sized,
    F: FnOnce() -> Result<T, MetadataError>,
{
    let _scope = PrivilegeScope::acquire(platform)?;
    body()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::PosixPlatform;

    #[test]
    fn posix_scope_holds_nothing() {
        let scope = PrivilegeScope::acquire(&PosixPlatform).expect("no-op acquire");
        assert!(scope.privileges().is_empty());
    }

    #[test]
    fn body_result_is_returned() {
        let value = with_elevated_privileges(&PosixPlatform, || Ok(7)).expect("body ran");
        assert_eq!(value, 7);
    }
}
