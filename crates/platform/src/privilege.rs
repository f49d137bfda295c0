//! Reference-counted process privileges.
//!
//! Windows privileges live on the process token, so they are shared by every
//! thread. [`PrivilegeSet`] counts holders per privilege: the token is only
//! adjusted when a count moves between zero and one. Concurrent elevation
//! scopes therefore never strip a privilege out from under each other.
//!
//! On platforms without a privilege concept the token operations succeed
//! without doing anything, which keeps the bookkeeping testable everywhere.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::PlatformError;

/// Privileges required to set arbitrary owners and restore security descriptors.
pub const RESTORE_PRIVILEGES: &[&str] = &["SeRestorePrivilege", "SeTakeOwnershipPrivilege"];

/// Holder counts for the process token. Every elevation scope in the
/// process must go through this one set.
pub static PROCESS_PRIVILEGES: PrivilegeSet = PrivilegeSet::new();

/// Privilege holder counts.
///
/// Use [`PROCESS_PRIVILEGES`] for the real token; separate sets only make
/// sense for bookkeeping tests.
#[derive(Debug, Default)]
pub struct PrivilegeSet {
    holders: Mutex<Vec<(&'static str, usize)>>,
}

impl PrivilegeSet {
    /// Creates an empty set with no privileges held.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            holders: Mutex::new(Vec::new()),
        }
    }

    // Counts are only changed after the token call they describe, so a
    // poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<(&'static str, usize)>> {
        self.holders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enables every privilege in `names`, or none of them.
    ///
    /// When a privilege cannot be enabled, the ones enabled earlier by this
    /// call are released again before the error is returned.
    pub fn enable(&self, names: &[&'static str]) -> Result<(), PlatformError> {
        let mut holders = self.lock();

        for (index, &name) in names.iter().enumerate() {
            let count = holder_count(&mut holders, name);
            if *count == 0 {
                if let Err(source) = sys::adjust(name, true) {
                    for acquired in &names[..index] {
                        release(&mut holders, acquired);
                    }
                    return Err(PlatformError::Privilege {
                        name: name.to_owned(),
                        source,
                    });
                }
            }
            *holder_count(&mut holders, name) += 1;
        }

        Ok(())
    }

    /// Releases one hold on every privilege in `names`.
    ///
    /// Privileges that are not currently held are ignored.
    pub fn disable(&self, names: &[&'static str]) {
        let mut holders = self.lock();
        for name in names {
            release(&mut holders, name);
        }
    }

    /// Returns how many scopes currently hold `name`.
    #[must_use]
    pub fn holders(&self, name: &str) -> usize {
        self.lock()
            .iter()
            .find(|(held, _)| *held == name)
            .map_or(0, |(_, count)| *count)
    }
}

fn holder_count<'a>(holders: &'a mut Vec<(&'static str, usize)>, name: &'static str) -> &'a mut usize {
    let index = match holders.iter().position(|(held, _)| *held == name) {
        Some(index) => index,
        None => {
            holders.push((name, 0));
            holders.len() - 1
        }
    };
    &mut holders[index].1
}

fn release(holders: &mut [(&'static str, usize)], name: &str) {
    if let Some((held, count)) = holders.iter_mut().find(|(held, _)| *held == name) {
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            // Dropping a privilege we hold only fails if the token vanished.
            let _ = sys::adjust(held, false);
        }
    }
}

#[cfg(windows)]
mod sys {
    #![allow(unsafe_code)]

    use std::io;

    use windows::Win32::Foundation::{
        CloseHandle, ERROR_NOT_ALL_ASSIGNED, GetLastError, HANDLE, LUID,
    };
    use windows::Win32::Security::{
        AdjustTokenPrivileges, LUID_AND_ATTRIBUTES, LookupPrivilegeValueW, SE_PRIVILEGE_ENABLED,
        TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_PRIVILEGES_ATTRIBUTES, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
    use windows::core::{HSTRING, PCWSTR};

    /// Process token handle closed on drop.
    struct Token(HANDLE);

    impl Drop for Token {
        fn drop(&mut self) {
            // Safety: the handle was returned by OpenProcessToken and is closed once.
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    pub(super) fn adjust(name: &str, enable: bool) -> io::Result<()> {
        let mut luid = LUID::default();
        // Safety: `luid` is a valid out pointer and the name is a NUL-terminated HSTRING.
        unsafe { LookupPrivilegeValueW(PCWSTR::null(), &HSTRING::from(name), &mut luid) }?;

        let mut handle = HANDLE::default();
        // Safety: the pseudo handle from GetCurrentProcess is always valid.
        unsafe {
            OpenProcessToken(
                GetCurrentProcess(),
                TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
                &mut handle,
            )
        }?;
        let token = Token(handle);

        let state = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: luid,
                Attributes: if enable {
                    SE_PRIVILEGE_ENABLED
                } else {
                    TOKEN_PRIVILEGES_ATTRIBUTES(0)
                },
            }],
        };

        // Safety: `state` outlives the call and no previous state is requested.
        unsafe { AdjustTokenPrivileges(token.0, false, Some(&state), 0, None, None) }?;

        // AdjustTokenPrivileges succeeds even when the privilege is absent from the token.
        // Safety: reads the calling thread's last-error value.
        let last = unsafe { GetLastError() };
        if last == ERROR_NOT_ALL_ASSIGNED {
            return Err(io::Error::from_raw_os_error(last.0 as i32));
        }
        Ok(())
    }
}

#[cfg(not(windows))]
mod sys {
    use std::io;

    pub(super) fn adjust(_name: &str, _enable: bool) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_enables_share_one_hold() {
        let set = PrivilegeSet::new();
        set.enable(RESTORE_PRIVILEGES).expect("first enable");
        set.enable(RESTORE_PRIVILEGES).expect("second enable");
        assert_eq!(set.holders("SeRestorePrivilege"), 2);
        assert_eq!(set.holders("SeTakeOwnershipPrivilege"), 2);

        set.disable(RESTORE_PRIVILEGES);
        assert_eq!(set.holders("SeRestorePrivilege"), 1);

        set.disable(RESTORE_PRIVILEGES);
        assert_eq!(set.holders("SeRestorePrivilege"), 0);
    }

    #[test]
    fn disabling_unheld_privilege_is_ignored() {
        let set = PrivilegeSet::new();
        set.disable(&["SeBackupPrivilege"]);
        assert_eq!(set.holders("SeBackupPrivilege"), 0);
    }

    #[test]
    fn poisoned_set_keeps_counting() {
        let set = PrivilegeSet::new();
        set.enable(RESTORE_PRIVILEGES).expect("enable");
        std::thread::scope(|scope| {
            let poisoner = scope.spawn(|| {
                let _guard = set.holders.lock();
                panic!("worker failed while holding the set");
            });
            assert!(poisoner.join().is_err());
        });
        assert!(set.holders.is_poisoned());

        set.enable(RESTORE_PRIVILEGES).expect("enable after poison");
        assert_eq!(set.holders("SeRestorePrivilege"), 2);
        set.disable(RESTORE_PRIVILEGES);
        set.disable(RESTORE_PRIVILEGES);
        assert_eq!(set.holders("SeRestorePrivilege"), 0);
    }

    // Token adjustments are no-ops off Windows, so no real privilege is needed.
    #[cfg(not(windows))]
    #[test]
    fn process_set_is_shared_by_every_caller() {
        let first: &PrivilegeSet = &PROCESS_PRIVILEGES;
        let second: &PrivilegeSet = &PROCESS_PRIVILEGES;
        first.enable(&["SeSecurityPrivilege"]).expect("first scope");
        second.enable(&["SeSecurityPrivilege"]).expect("second scope");

        first.disable(&["SeSecurityPrivilege"]);
        assert_eq!(second.holders("SeSecurityPrivilege"), 1);
        second.disable(&["SeSecurityPrivilege"]);
        assert_eq!(PROCESS_PRIVILEGES.holders("SeSecurityPrivilege"), 0);
    }

    #[test]
    fn empty_request_is_a_no_op() {
        let set = PrivilegeSet::new();
        set.enable(&[]).expect("nothing to enable");
        assert_eq!(set.holders("SeRestorePrivilege"), 0);
    }
}
