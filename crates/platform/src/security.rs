//! Named-object security descriptor access for files and directories.
#![allow(unsafe_code)]

use std::ffi::c_void;
use std::io;
use std::path::Path;
use std::ptr;

use windows::Win32::Foundation::{GENERIC_ALL, HLOCAL, LocalFree, WIN32_ERROR};
use windows::Win32::Security::Authorization::{
    EXPLICIT_ACCESS_W, GRANT_ACCESS, GetNamedSecurityInfoW, NO_MULTIPLE_TRUSTEE, SE_FILE_OBJECT,
    SetEntriesInAclW, SetNamedSecurityInfoW, TRUSTEE_IS_SID, TRUSTEE_IS_USER, TRUSTEE_W,
};
use windows::Win32::Security::{
    ACL, DACL_SECURITY_INFORMATION, GROUP_SECURITY_INFORMATION, NO_INHERITANCE,
    OBJECT_SECURITY_INFORMATION, OWNER_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID,
    SUB_CONTAINERS_AND_OBJECTS_INHERIT, UNPROTECTED_DACL_SECURITY_INFORMATION,
};
use windows::core::{HSTRING, PWSTR};

use crate::PlatformError;
use crate::sid::Sid;

/// Memory returned by a Win32 API that must be released with `LocalFree`.
struct LocalBuffer(*mut c_void);

impl Drop for LocalBuffer {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // Safety: the pointer was allocated by the system with LocalAlloc.
            unsafe {
                let _ = LocalFree(Some(HLOCAL(self.0)));
            }
        }
    }
}

/// Returns the owner and primary group recorded on `path`.
pub fn owner_and_group(path: &Path) -> Result<(Sid, Sid), PlatformError> {
    let name = HSTRING::from(path.as_os_str());
    let mut owner = PSID::default();
    let mut group = PSID::default();
    let mut descriptor = PSECURITY_DESCRIPTOR::default();

    // Safety: all out pointers are valid; the descriptor is freed by `LocalBuffer`.
    let status = unsafe {
        GetNamedSecurityInfoW(
            &name,
            SE_FILE_OBJECT,
            OWNER_SECURITY_INFORMATION | GROUP_SECURITY_INFORMATION,
            Some(&mut owner),
            Some(&mut group),
            None,
            None,
            &mut descriptor,
        )
    };
    let _descriptor = LocalBuffer(descriptor.0);
    check(status, "read owner", path)?;

    // Safety: both SIDs point into the descriptor, which is still alive.
    Ok(unsafe { (Sid::copy_from(owner), Sid::copy_from(group)) })
}

/// Sets the owner and/or primary group of `path`.
///
/// Axes passed as `None` are left untouched.
pub fn set_owner_and_group(
    path: &Path,
    owner: Option<&Sid>,
    group: Option<&Sid>,
) -> Result<(), PlatformError> {
    let mut info = OBJECT_SECURITY_INFORMATION(0);
    if owner.is_some() {
        info |= OWNER_SECURITY_INFORMATION;
    }
    if group.is_some() {
        info |= GROUP_SECURITY_INFORMATION;
    }
    if info.0 == 0 {
        return Ok(());
    }

    let name = HSTRING::from(path.as_os_str());
    // Safety: the SIDs outlive the call.
    let status = unsafe {
        SetNamedSecurityInfoW(
            &name,
            SE_FILE_OBJECT,
            info,
            owner.map(Sid::as_psid),
            group.map(Sid::as_psid),
            None,
            None,
        )
    };
    check(status, "set owner", path)
}

/// Merges a full-control grant for `grantee` into the DACL of `path`.
///
/// The existing entries are preserved and the DACL is written back
/// unprotected so it keeps inheriting from the parent. When `inheritable`
/// is set the new entry propagates to children created later.
pub fn grant_full_control(path: &Path, grantee: &Sid, inheritable: bool) -> Result<(), PlatformError> {
    let name = HSTRING::from(path.as_os_str());
    let mut dacl: *mut ACL = ptr::null_mut();
    let mut descriptor = PSECURITY_DESCRIPTOR::default();

    // Safety: out pointers are valid; the descriptor is freed by `LocalBuffer`.
    let status = unsafe {
        GetNamedSecurityInfoW(
            &name,
            SE_FILE_OBJECT,
            DACL_SECURITY_INFORMATION,
            None,
            None,
            Some(&mut dacl),
            None,
            &mut descriptor,
        )
    };
    let _descriptor = LocalBuffer(descriptor.0);
    check(status, "read DACL", path)?;

    let entry = EXPLICIT_ACCESS_W {
        grfAccessPermissions: GENERIC_ALL.0,
        grfAccessMode: GRANT_ACCESS,
        grfInheritance: if inheritable {
            SUB_CONTAINERS_AND_OBJECTS_INHERIT
        } else {
            NO_INHERITANCE
        },
        Trustee: TRUSTEE_W {
            pMultipleTrustee: ptr::null_mut(),
            MultipleTrusteeOperation: NO_MULTIPLE_TRUSTEE,
            TrusteeForm: TRUSTEE_IS_SID,
            TrusteeType: TRUSTEE_IS_USER,
            ptstrName: PWSTR(grantee.as_psid().0.cast()),
        },
    };

    let mut merged: *mut ACL = ptr::null_mut();
    // Safety: `dacl` belongs to the live descriptor; `merged` is freed by `LocalBuffer`.
    let status = unsafe { SetEntriesInAclW(Some(&[entry]), Some(dacl.cast_const()), &mut merged) };
    let _merged = LocalBuffer(merged.cast());
    check(status, "merge DACL", path)?;

    // Safety: `merged` stays alive until the end of this function.
    let status = unsafe {
        SetNamedSecurityInfoW(
            &name,
            SE_FILE_OBJECT,
            DACL_SECURITY_INFORMATION | UNPROTECTED_DACL_SECURITY_INFORMATION,
            None,
            None,
            Some(merged.cast_const()),
            None,
        )
    };
    check(status, "write DACL", path)
}

fn check(status: WIN32_ERROR, operation: &'static str, path: &Path) -> Result<(), PlatformError> {
    if status.is_ok() {
        return Ok(());
    }
    Err(PlatformError::Security {
        operation,
        path: path.to_path_buf(),
        source: io::Error::from_raw_os_error(status.0 as i32),
    })
}
