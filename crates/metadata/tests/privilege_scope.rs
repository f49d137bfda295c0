//! Privilege scope acquisition and release.

mod common;

use common::RecordingPlatform;
use metadata::{ErrorKind, MetadataError, PrivilegeScope, with_elevated_privileges};
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

#[test]
fn scope_releases_on_drop() {
    let platform = RecordingPlatform::windows_like();
    {
        let scope = PrivilegeScope::acquire(&platform).expect("acquire");
        assert_eq!(scope.privileges().len(), 2);
        assert_eq!(platform.enabled(), 1);
        assert_eq!(platform.disabled(), 0);
    }
    assert_eq!(platform.disabled(), 1);
}

#[test]
fn body_error_still_releases() {
    let platform = RecordingPlatform::windows_like();
    let result: Result<(), _> = with_elevated_privileges(&platform, || {
        Err(MetadataError::new(
            ErrorKind::Io,
            "do work",
            Path::new("x"),
            io::Error::other("boom"),
        ))
    });
    assert_eq!(result.expect_err("body failed").kind(), ErrorKind::Io);
    assert_eq!(platform.disabled(), 1);
}

#[test]
fn panic_in_body_still_releases() {
    let platform = RecordingPlatform::windows_like();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let _ = with_elevated_privileges(&platform, || -> Result<(), MetadataError> {
            panic!("body panicked");
        });
    }));
    assert!(outcome.is_err());
    assert_eq!(platform.enabled(), 1);
    assert_eq!(platform.disabled(), 1);
}

#[test]
fn failed_acquisition_skips_body() {
    let platform = RecordingPlatform::windows_like().failing_privileges();
    let mut ran = false;
    let error = with_elevated_privileges(&platform, || {
        ran = true;
        Ok(())
    })
    .expect_err("acquisition fails");
    assert_eq!(error.kind(), ErrorKind::PrivilegeAcquisitionFailed);
    assert!(!ran);
    assert_eq!(platform.disabled(), 0);
}

#[test]
fn platform_without_privileges_makes_no_calls() {
    let platform = RecordingPlatform::posix();
    with_elevated_privileges(&platform, || Ok(())).expect("no-op");
    assert_eq!(platform.enabled(), 0);
    assert_eq!(platform.disabled(), 0);
}

#[test]
fn nested_scopes_release_in_order() {
    let platform = RecordingPlatform::windows_like();
    let outer = PrivilegeScope::acquire(&platform).expect("outer");
    let inner = PrivilegeScope::acquire(&platform).expect("inner");
    drop(inner);
    assert_eq!(platform.disabled(), 1);
    drop(outer);
    assert_eq!(platform.enabled(), 2);
    assert_eq!(platform.disabled(), 2);
}
