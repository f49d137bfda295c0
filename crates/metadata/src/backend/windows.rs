use super::{Capabilities, Grantee, MetadataPlatform};
use crate::error::{Axis, ErrorKind, MetadataError};
use crate::filetime_ticks::{from_ticks, to_system_time};
use crate::identity::IdentityKind;
use crate::record::{FileTimestamps, ResolvedTimes};
use ::platform::PlatformError;
use ::platform::privilege::{PROCESS_PRIVILEGES, RESTORE_PRIVILEGES};
use ::platform::security;
use ::platform::sid::{CREATOR_OWNER, Sid};
use filetime::FileTime;
use std::fs::{self, FileTimes, OpenOptions};
use std::io;
use std::os::windows::fs::{FileTimesExt, MetadataExt, OpenOptionsExt};
use std::path::Path;
use ::windows::Win32::Storage::FileSystem::{FILE_FLAG_BACKUP_SEMANTICS, FILE_WRITE_ATTRIBUTES};

/// Windows metadata primitives: FILETIMEs, security descriptors, and
/// process token privileges.
///
/// Privilege counts live in [`PROCESS_PRIVILEGES`], shared by every platform
/// value in the process, because they describe the one process token.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    /// How many active scopes in the process hold `privilege`.
    #[must_use]
    pub fn privilege_holders(&self, privilege: &str) -> usize {
        PROCESS_PRIVILEGES.holders(privilege)
    }
}

fn lookup_failed(context: &'static str, error: PlatformError) -> MetadataError {
    MetadataError::invalid_identity(context, error.into_io_error())
}

fn system_time(path: &Path, time: FileTime) -> Result<std::time::SystemTime, MetadataError> {
    to_system_time(time).ok_or_else(|| {
        MetadataError::apply(
            Axis::Times,
            "convert time",
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "time outside the FILETIME range"),
        )
    })
}

impl MetadataPlatform for WindowsPlatform {
    type Principal = Sid;

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            writes_creation_time: true,
            discretionary_acl: true,
            privileges: RESTORE_PRIVILEGES,
        }
    }

    fn parse_identity(&self, identity: &str) -> Result<Sid, MetadataError> {
        match Sid::parse(identity) {
            Ok(sid) => Ok(sid),
            Err(error) if Sid::is_malformed_sid_error(&error) => Sid::lookup_account(identity)
                .map_err(|error| lookup_failed("look up account", error)),
            Err(error) => Err(lookup_failed("parse SID", error)),
        }
    }

    fn principal_to_string(&self, principal: &Sid) -> String {
        principal.to_string()
    }

    fn resolve_display_name(&self, principal: &Sid, _kind: IdentityKind) -> Result<String, MetadataError> {
        principal.account_name().map_err(|error| {
            MetadataError::new(
                ErrorKind::DisplayNameUnavailable,
                "resolve account name",
                Path::new(""),
                error.into_io_error(),
            )
        })
    }

    fn read_times(&self, path: &Path) -> Result<FileTimestamps, MetadataError> {
        let metadata =
            fs::metadata(path).map_err(|error| MetadataError::read("read times", path, error))?;
        Ok(FileTimestamps {
            accessed: from_ticks(metadata.last_access_time()),
            modified: from_ticks(metadata.last_write_time()),
            created: from_ticks(metadata.creation_time()),
        })
    }

    fn write_times(&self, path: &Path, times: &ResolvedTimes) -> Result<(), MetadataError> {
        let mut file_times = FileTimes::new()
            .set_accessed(system_time(path, times.accessed)?)
            .set_modified(system_time(path, times.modified)?);
        if let Some(created) = times.created {
            file_times = file_times.set_created(system_time(path, created)?);
        }

        // Backup semantics let directories be opened for attribute writes.
        let file = OpenOptions::new()
            .access_mode(FILE_WRITE_ATTRIBUTES.0)
            .custom_flags(FILE_FLAG_BACKUP_SEMANTICS.0)
            .open(path)
            .map_err(|error| MetadataError::apply(Axis::Times, "open for time update", path, error))?;
        file.set_times(file_times)
            .map_err(|error| MetadataError::apply(Axis::Times, "set times", path, error))
    }

    fn read_owner_group(&self, path: &Path) -> Result<(Sid, Sid), MetadataError> {
        security::owner_and_group(path)
            .map_err(|error| MetadataError::read("read security descriptor", path, error.into_io_error()))
    }

    fn set_owner_group(
        &self,
        path: &Path,
        owner: Option<&Sid>,
        group: Option<&Sid>,
    ) -> Result<(), MetadataError> {
        security::set_owner_and_group(path, owner, group).map_err(|error| {
            MetadataError::apply(Axis::Owner, "set owner", path, error.into_io_error())
        })
    }

    fn grant_owner_access(&self, path: &Path, grantee: Grantee<'_, Sid>) -> Result<(), MetadataError> {
        let apply_failed =
            |error: PlatformError| MetadataError::apply(Axis::Acl, "merge DACL", path, error.into_io_error());
        match grantee {
            Grantee::Principal(sid) => security::grant_full_control(path, sid, false).map_err(apply_failed),
            Grantee::CreatorOwner => {
                let creator_owner = Sid::parse(CREATOR_OWNER).map_err(apply_failed)?;
                security::grant_full_control(path, &creator_owner, true).map_err(apply_failed)
            }
        }
    }

    fn enable_privileges(&self, privileges: &[&'static str]) -> Result<(), MetadataError> {
        PROCESS_PRIVILEGES.enable(privileges).map_err(|error| {
            MetadataError::new(
                ErrorKind::PrivilegeAcquisitionFailed,
                "enable privilege",
                Path::new(""),
                error.into_io_error(),
            )
        })
    }

    fn disable_privileges(&self, privileges: &[&'static str]) {
        PROCESS_PRIVILEGES.disable(privileges);
    }
}
