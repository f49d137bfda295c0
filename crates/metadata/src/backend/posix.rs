#![allow(unsafe_code)]

use super::{Capabilities, MetadataPlatform};
use crate::error::{Axis, ErrorKind, MetadataError};
use crate::identity::IdentityKind;
use crate::record::{FileTimestamps, ResolvedTimes};
use filetime::{FileTime, set_file_times};
use rustix::fs::{AtFlags, CWD, chownat};
use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Numeric user or group id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PosixId(u32);

impl PosixId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PosixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// POSIX metadata primitives: `utimensat`, `lchown`, and the passwd/group
/// databases.
#[derive(Clone, Copy, Debug, Default)]
pub struct PosixPlatform;

impl MetadataPlatform for PosixPlatform {
    type Principal = PosixId;

    fn capabilities(&self) -> Capabilities {
        Capabilities::BASIC
    }

    fn parse_identity(&self, identity: &str) -> Result<PosixId, MetadataError> {
        identity.parse::<u32>().map(PosixId).map_err(|error| {
            MetadataError::invalid_identity(
                "parse numeric identity",
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{identity}' is not a numeric id: {error}"),
                ),
            )
        })
    }

    fn principal_to_string(&self, principal: &PosixId) -> String {
        principal.to_string()
    }

    fn resolve_display_name(
        &self,
        principal: &PosixId,
        kind: IdentityKind,
    ) -> Result<String, MetadataError> {
        let looked_up = match kind {
            IdentityKind::Owner => ::platform::accounts::user_name(principal.as_raw()),
            IdentityKind::Group => ::platform::accounts::group_name(principal.as_raw()),
        };
        let unavailable = |source: io::Error| {
            MetadataError::new(
                ErrorKind::DisplayNameUnavailable,
                "resolve account name",
                Path::new(""),
                source,
            )
        };
        match looked_up {
            Ok(Some(name)) => Ok(name),
            Ok(None) => Err(unavailable(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no {kind} account with id {principal}"),
            ))),
            Err(error) => Err(unavailable(error.into_io_error())),
        }
    }

    fn read_times(&self, path: &Path) -> Result<FileTimestamps, MetadataError> {
        read_timestamps(path).map_err(|error| MetadataError::read("read times", path, error))
    }

    fn write_times(&self, path: &Path, times: &ResolvedTimes) -> Result<(), MetadataError> {
        set_file_times(path, times.accessed, times.modified)
            .map_err(|error| MetadataError::apply(Axis::Times, "set times", path, error))
    }

    fn read_owner_group(&self, path: &Path) -> Result<(PosixId, PosixId), MetadataError> {
        let metadata = fs::metadata(path)
            .map_err(|error| MetadataError::read("read ownership", path, error))?;
        Ok((PosixId(metadata.uid()), PosixId(metadata.gid())))
    }

    fn set_owner_group(
        &self,
        path: &Path,
        owner: Option<&PosixId>,
        group: Option<&PosixId>,
    ) -> Result<(), MetadataError> {
        chownat(
            CWD,
            path,
            owner.map(|id| uid_from_raw(id.as_raw())),
            group.map(|id| gid_from_raw(id.as_raw())),
            AtFlags::SYMLINK_NOFOLLOW,
        )
        .map_err(|error| MetadataError::apply(Axis::Owner, "change ownership", path, error.into()))
    }
}

fn uid_from_raw(raw: rustix::process::RawUid) -> rustix::fs::Uid {
    unsafe { rustix::fs::Uid::from_raw(raw) }
}

fn gid_from_raw(raw: rustix::process::RawGid) -> rustix::fs::Gid {
    unsafe { rustix::fs::Gid::from_raw(raw) }
}

/// Reads times through `statx` so the birth time is available where the
/// filesystem records one.
#[cfg(target_os = "linux")]
fn read_timestamps(path: &Path) -> io::Result<FileTimestamps> {
    use rustix::fs::{StatxFlags, StatxTimestamp, statx};

    let stamp = |ts: StatxTimestamp| FileTime::from_unix_time(ts.tv_sec, ts.tv_nsec);
    let mask = StatxFlags::ATIME
        .union(StatxFlags::MTIME)
        .union(StatxFlags::CTIME)
        .union(StatxFlags::BTIME);

    match statx(CWD, path, AtFlags::empty(), mask) {
        Ok(status) => {
            let created = if status.stx_mask & StatxFlags::BTIME.bits() != 0 {
                stamp(status.stx_btime)
            } else {
                stamp(status.stx_ctime)
            };
            Ok(FileTimestamps {
                accessed: stamp(status.stx_atime),
                modified: stamp(status.stx_mtime),
                created,
            })
        }
        Err(error) if error.raw_os_error() == libc::ENOSYS => read_timestamps_with_stat(path),
        Err(error) => Err(error.into()),
    }
}

#[cfg(not(target_os = "linux"))]
fn read_timestamps(path: &Path) -> io::Result<FileTimestamps> {
    read_timestamps_with_stat(path)
}

fn read_timestamps_with_stat(path: &Path) -> io::Result<FileTimestamps> {
    let metadata = fs::metadata(path)?;
    let status_change = FileTime::from_unix_time(metadata.ctime(), metadata.ctime_nsec() as u32);
    Ok(FileTimestamps {
        accessed: FileTime::from_last_access_time(&metadata),
        modified: FileTime::from_last_modification_time(&metadata),
        created: FileTime::from_creation_time(&metadata).unwrap_or(status_change),
    })
}
