//! Owned Windows security identifiers.
#![allow(unsafe_code)]

use std::ffi::c_void;
use std::fmt;
use std::io;

use windows::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_SID, HLOCAL, LocalFree};
use windows::Win32::Security::Authorization::{ConvertSidToStringSidW, ConvertStringSidToSidW};
use windows::Win32::Security::{
    GetLengthSid, IsValidSid, LookupAccountNameW, LookupAccountSidW, PSID, SID_NAME_USE,
};
use windows::core::{HSTRING, PCWSTR, PWSTR};

use crate::PlatformError;

/// The well-known `CREATOR OWNER` placeholder principal.
pub const CREATOR_OWNER: &str = "S-1-3-0";

/// A security identifier copied into owned memory.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sid(Vec<u8>);

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

impl Sid {
    /// Parses a canonical string SID such as `S-1-5-32-544`.
    pub fn parse(text: &str) -> Result<Self, PlatformError> {
        let mut psid = PSID::default();
        // Safety: `psid` receives a LocalAlloc'd SID freed by `LocalBuffer`.
        unsafe { ConvertStringSidToSidW(&HSTRING::from(text), &mut psid) }.map_err(|error| {
            PlatformError::InvalidSid {
                subject: text.to_owned(),
                source: error.into(),
            }
        })?;
        let _buffer = LocalBuffer(psid.0);
        // Safety: `psid` points at a valid SID until `_buffer` is dropped.
        Ok(unsafe { Self::copy_from(psid) })
    }

    /// Reports whether a parse failure means the text is not SID syntax at all.
    #[must_use]
    pub fn is_malformed_sid_error(error: &PlatformError) -> bool {
        matches!(error, PlatformError::InvalidSid { source, .. }
            if source.raw_os_error() == Some(ERROR_INVALID_SID.0 as i32))
    }

    /// Resolves an account or group name, e.g. `BUILTIN\Administrators`.
    pub fn lookup_account(name: &str) -> Result<Self, PlatformError> {
        let wide = HSTRING::from(name);
        let mut sid_len = 0u32;
        let mut domain_len = 0u32;
        let mut use_kind = SID_NAME_USE::default();

        // Safety: size query with null output buffers.
        let probe = unsafe {
            LookupAccountNameW(
                PCWSTR::null(),
                &wide,
                None,
                &mut sid_len,
                None,
                &mut domain_len,
                &mut use_kind,
            )
        };
        if let Err(error) = probe {
            if error.code() != ERROR_INSUFFICIENT_BUFFER.to_hresult() {
                return Err(lookup_error(name, error));
            }
        }

        let mut sid = vec![0u8; sid_len as usize];
        let mut domain = vec![0u16; domain_len as usize];
        // Safety: both buffers are sized from the probe above.
        unsafe {
            LookupAccountNameW(
                PCWSTR::null(),
                &wide,
                Some(PSID(sid.as_mut_ptr().cast())),
                &mut sid_len,
                Some(PWSTR(domain.as_mut_ptr())),
                &mut domain_len,
                &mut use_kind,
            )
        }
        .map_err(|error| lookup_error(name, error))?;

        sid.truncate(sid_len as usize);
        Ok(Self(sid))
    }

    /// Returns the `DOMAIN\name` account registered for this SID.
    pub fn account_name(&self) -> Result<String, PlatformError> {
        let mut name_len = 0u32;
        let mut domain_len = 0u32;
        let mut use_kind = SID_NAME_USE::default();

        // Safety: size query with null output buffers.
        let probe = unsafe {
            LookupAccountSidW(
                PCWSTR::null(),
                self.as_psid(),
                None,
                &mut name_len,
                None,
                &mut domain_len,
                &mut use_kind,
            )
        };
        if let Err(error) = probe {
            if error.code() != ERROR_INSUFFICIENT_BUFFER.to_hresult() {
                return Err(lookup_error(&self.to_string(), error));
            }
        }

        let mut name = vec![0u16; name_len as usize];
        let mut domain = vec![0u16; domain_len as usize];
        // Safety: both buffers are sized from the probe above.
        unsafe {
            LookupAccountSidW(
                PCWSTR::null(),
                self.as_psid(),
                Some(PWSTR(name.as_mut_ptr())),
                &mut name_len,
                Some(PWSTR(domain.as_mut_ptr())),
                &mut domain_len,
                &mut use_kind,
            )
        }
        .map_err(|error| lookup_error(&self.to_string(), error))?;

        let name = String::from_utf16_lossy(&name[..name_len as usize]);
        let domain = String::from_utf16_lossy(&domain[..domain_len as usize]);
        if domain.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{domain}\\{name}"))
        }
    }

    /// Borrows the SID as a `PSID` for Win32 calls.
    ///
    /// The returned pointer is valid for as long as `self` is.
    #[must_use]
    pub fn as_psid(&self) -> PSID {
        PSID(self.0.as_ptr().cast_mut().cast())
    }

    /// Copies a SID owned by the system into a new [`Sid`].
    ///
    /// # Safety
    ///
    /// `psid` must point at a valid SID.
    pub(crate) unsafe fn copy_from(psid: PSID) -> Self {
        // Safety: guaranteed by the caller.
        let len = unsafe { GetLengthSid(psid) } as usize;
        // Safety: a valid SID spans exactly `len` bytes.
        let bytes = unsafe { std::slice::from_raw_parts(psid.0.cast::<u8>(), len) };
        Self(bytes.to_vec())
    }

    fn string_form(&self) -> io::Result<String> {
        // Safety: `self` holds a SID produced by the system.
        if !unsafe { IsValidSid(self.as_psid()) }.as_bool() {
            return Err(io::Error::from_raw_os_error(ERROR_INVALID_SID.0 as i32));
        }
        let mut text = PWSTR::null();
        // Safety: `text` receives a LocalAlloc'd string freed by `LocalBuffer`.
        unsafe { ConvertSidToStringSidW(self.as_psid(), &mut text) }?;
        let _buffer = LocalBuffer(text.0.cast());
        // Safety: the system returned a NUL-terminated wide string.
        unsafe { text.to_string() }.map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.string_form() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("S-?"),
        }
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sid").field(&self.to_string()).finish()
    }
}

fn lookup_error(subject: &str, error: windows::core::Error) -> PlatformError {
    PlatformError::AccountLookup {
        subject: subject.to_owned(),
        source: error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_sid_round_trips() {
        let sid = Sid::parse("S-1-5-32-544").expect("parse administrators");
        assert_eq!(sid.to_string(), "S-1-5-32-544");
    }

    #[test]
    fn name_is_not_sid_syntax() {
        let error = Sid::parse("Administrators").expect_err("not a SID");
        assert!(Sid::is_malformed_sid_error(&error));
    }

    #[test]
    fn creator_owner_parses() {
        Sid::parse(CREATOR_OWNER).expect("creator owner");
    }
}
