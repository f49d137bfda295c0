//! In-memory platform that records every native call.

#![allow(dead_code)]

use filetime::FileTime;
use metadata::{
    Capabilities, ErrorKind, FileTimestamps, Grantee, IdentityKind, MetadataError,
    MetadataPlatform, ResolvedTimes,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use test_support::CallCounter;

pub const WINDOWS_LIKE: Capabilities = Capabilities {
    writes_creation_time: true,
    discretionary_acl: true,
    privileges: &["SeRestorePrivilege", "SeTakeOwnershipPrivilege"],
};

/// Fake platform with numeric principals.
#[derive(Debug)]
pub struct RecordingPlatform {
    capabilities: Capabilities,
    current: FileTimestamps,
    fail_ownership_on: Option<PathBuf>,
    fail_privileges: bool,
    pub ownership: CallCounter,
    pub grants: Mutex<Vec<(PathBuf, String)>>,
    pub time_reads: AtomicUsize,
    pub time_writes: Mutex<Vec<(PathBuf, ResolvedTimes)>>,
    pub enables: AtomicUsize,
    pub disables: AtomicUsize,
}

impl RecordingPlatform {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            current: FileTimestamps {
                accessed: FileTime::from_unix_time(100, 0),
                modified: FileTime::from_unix_time(200, 0),
                created: FileTime::from_unix_time(50, 0),
            },
            fail_ownership_on: None,
            fail_privileges: false,
            ownership: CallCounter::new(),
            grants: Mutex::new(Vec::new()),
            time_reads: AtomicUsize::new(0),
            time_writes: Mutex::new(Vec::new()),
            enables: AtomicUsize::new(0),
            disables: AtomicUsize::new(0),
        }
    }

    pub fn posix() -> Self {
        Self::new(Capabilities::BASIC)
    }

    pub fn windows_like() -> Self {
        Self::new(WINDOWS_LIKE)
    }

    pub fn failing_ownership_on(mut self, path: &str) -> Self {
        self.fail_ownership_on = Some(PathBuf::from(path));
        self
    }

    pub fn failing_privileges(mut self) -> Self {
        self.fail_privileges = true;
        self
    }

    pub fn current_times(&self) -> FileTimestamps {
        self.current
    }

    pub fn reads(&self) -> usize {
        self.time_reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(PathBuf, ResolvedTimes)> {
        self.time_writes.lock().expect("writes").clone()
    }

    pub fn grant_log(&self) -> Vec<(PathBuf, String)> {
        self.grants.lock().expect("grants").clone()
    }

    pub fn enabled(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disabled(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }
}

impl MetadataPlatform for RecordingPlatform {
    type Principal = u32;

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn parse_identity(&self, identity: &str) -> Result<u32, MetadataError> {
        identity.parse().map_err(|_| {
            MetadataError::new(
                ErrorKind::InvalidOwnershipFormat,
                "parse numeric identity",
                Path::new(""),
                io::Error::new(io::ErrorKind::InvalidInput, identity.to_owned()),
            )
        })
    }

    fn principal_to_string(&self, principal: &u32) -> String {
        principal.to_string()
    }

    fn resolve_display_name(&self, principal: &u32, kind: IdentityKind) -> Result<String, MetadataError> {
        Ok(format!("{kind}{principal}"))
    }

    fn read_times(&self, _path: &Path) -> Result<FileTimestamps, MetadataError> {
        self.time_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.current)
    }

    fn write_times(&self, path: &Path, times: &ResolvedTimes) -> Result<(), MetadataError> {
        self.time_writes
            .lock()
            .expect("writes")
            .push((path.to_path_buf(), *times));
        Ok(())
    }

    fn read_owner_group(&self, _path: &Path) -> Result<(u32, u32), MetadataError> {
        Ok((1000, 1000))
    }

    fn set_owner_group(
        &self,
        path: &Path,
        _owner: Option<&u32>,
        _group: Option<&u32>,
    ) -> Result<(), MetadataError> {
        self.ownership.record(path);
        if self.fail_ownership_on.as_deref() == Some(path) {
            return Err(MetadataError::new(
                ErrorKind::ApplyFailed(metadata::Axis::Owner),
                "change ownership",
                path,
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(())
    }

    fn grant_owner_access(&self, path: &Path, grantee: Grantee<'_, u32>) -> Result<(), MetadataError> {
        let grantee = match grantee {
            Grantee::Principal(principal) => principal.to_string(),
            Grantee::CreatorOwner => "creator-owner".to_owned(),
        };
        self.grants
            .lock()
            .expect("grants")
            .push((path.to_path_buf(), grantee));
        Ok(())
    }

    fn enable_privileges(&self, _privileges: &[&'static str]) -> Result<(), MetadataError> {
        if self.fail_privileges {
            return Err(MetadataError::new(
                ErrorKind::PrivilegeAcquisitionFailed,
                "enable privilege",
                Path::new(""),
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        self.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable_privileges(&self, _privileges: &[&'static str]) {
        self.disables.fetch_add(1, Ordering::SeqCst);
    }
}
