//! User and group database lookups for POSIX identities.
//!
//! Lookups go through `getpwuid_r`/`getgrgid_r` (via `nix`), so NSS modules
//! such as LDAP or SSSD are honoured. A missing entry is `Ok(None)`; only a
//! failure of the database itself is an error. On non-Unix targets every
//! lookup reports `Ok(None)`.

use crate::PlatformError;

/// Returns the login name registered for `uid`.
#[cfg(unix)]
pub fn user_name(uid: u32) -> Result<Option<String>, PlatformError> {
    use nix::unistd::{Uid, User};

    User::from_uid(Uid::from_raw(uid))
        .map(|user| user.map(|user| user.name))
        .map_err(|errno| PlatformError::AccountLookup {
            subject: uid.to_string(),
            source: errno.into(),
        })
}

/// Returns the group name registered for `gid`.
#[cfg(unix)]
pub fn group_name(gid: u32) -> Result<Option<String>, PlatformError> {
    use nix::unistd::{Gid, Group};

    Group::from_gid(Gid::from_raw(gid))
        .map(|group| group.map(|group| group.name))
        .map_err(|errno| PlatformError::AccountLookup {
            subject: gid.to_string(),
            source: errno.into(),
        })
}

/// Returns the effective user and group ids of the calling process.
#[cfg(unix)]
#[must_use]
pub fn effective_ids() -> (u32, u32) {
    (
        nix::unistd::geteuid().as_raw(),
        nix::unistd::getegid().as_raw(),
    )
}

/// Reports whether the calling process runs with an effective uid of 0.
#[cfg(unix)]
#[must_use]
pub fn is_superuser() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Returns the login name registered for `uid`.
#[cfg(not(unix))]
pub fn user_name(_uid: u32) -> Result<Option<String>, PlatformError> {
    Ok(None)
}

/// Returns the group name registered for `gid`.
#[cfg(not(unix))]
pub fn group_name(_gid: u32) -> Result<Option<String>, PlatformError> {
    Ok(None)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn root_user_resolves_by_uid() {
        let name = user_name(0).expect("lookup succeeds");
        assert_eq!(name.as_deref(), Some("root"));
    }

    #[test]
    fn unknown_uid_is_reported_as_missing() {
        let name = user_name(4_000_000_001).expect("lookup succeeds");
        assert!(name.is_none());
    }

    #[test]
    fn unknown_gid_is_reported_as_missing() {
        let name = group_name(4_000_000_002).expect("lookup succeeds");
        assert!(name.is_none());
    }

    #[test]
    fn effective_ids_match_superuser_flag() {
        let (uid, _gid) = effective_ids();
        assert_eq!(uid == 0, is_superuser());
    }
}
