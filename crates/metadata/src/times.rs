//! Timestamp restoration policy.
//!
//! # Invariants
//!
//! - A write that would change nothing the platform can store is skipped
//!   entirely: no read and no write reach the filesystem.
//! - Access and modification time are always written together. A missing one
//!   is filled from the file's current value, read once.
//! - Creation time only reaches the platform when it can store it.

use crate::backend::MetadataPlatform;
use crate::error::MetadataError;
use crate::record::{FileTimestamps, ResolvedTimes, Timestamps};
use logging::trace_times;
use std::path::Path;

/// Reads the current timestamps of `path`.
///
/// # Errors
///
/// Fails with [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) when the
/// path is missing, [`ErrorKind::Io`](crate::ErrorKind::Io) otherwise.
pub fn read_times<P: MetadataPlatform>(platform: &P, path: &Path) -> Result<FileTimestamps, MetadataError> {
    platform.read_times(path)
}

/// Restores `requested` onto `path`.
///
/// Returns the values written, or `None` when the write was skipped because
/// nothing storable was recorded.
///
/// # Errors
///
/// Propagates read failures while filling a missing field and write
/// failures from the platform.
pub fn write_times<P: MetadataPlatform>(
    platform: &P,
    path: &Path,
    requested: &Timestamps,
) -> Result<Option<ResolvedTimes>, MetadataError> {
    let created = requested
        .created
        .filter(|_| platform.capabilities().writes_creation_time);

    if requested.accessed.is_none() && requested.modified.is_none() && created.is_none() {
        trace_times!(path = %path.display(), "no storable timestamps recorded; skipping");
        return Ok(None);
    }

    let (accessed, modified) = match (requested.accessed, requested.modified) {
        (Some(accessed), Some(modified)) => (accessed, modified),
        (accessed, modified) => {
            let current = platform.read_times(path)?;
            (
                accessed.unwrap_or(current.accessed),
                modified.unwrap_or(current.modified),
            )
        }
    };

    let resolved = ResolvedTimes {
        accessed,
        modified,
        created,
    };
    platform.write_times(path, &resolved)?;
    trace_times!(
        path = %path.display(),
        atime = accessed.unix_seconds(),
        mtime = modified.unix_seconds(),
        created = created.is_some(),
        "restored timestamps"
    );
    Ok(Some(resolved))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::PosixPlatform;
    use filetime::FileTime;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creation_only_record_is_skipped_on_posix() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("never-created");
        let requested = Timestamps::none().with_created(FileTime::from_unix_time(5, 0));

        // The path does not exist, so any filesystem access would fail.
        let written = write_times(&PosixPlatform, &missing, &requested).expect("skipped");
        assert_eq!(written, None);
    }

    #[test]
    fn modification_only_preserves_access_time() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("file.txt");
        fs::write(&file, b"data").expect("write file");
        let atime = FileTime::from_unix_time(1_111_111_111, 0);
        filetime::set_file_atime(&file, atime).expect("seed atime");

        let mtime = FileTime::from_unix_time(1_222_222_222, 0);
        let written = write_times(&PosixPlatform, &file, &Timestamps::none().with_modified(mtime))
            .expect("write")
            .expect("not skipped");
        assert_eq!(written.accessed, atime);

        let observed = read_times(&PosixPlatform, &file).expect("read back");
        assert_eq!(observed.accessed, atime);
        assert_eq!(observed.modified, mtime);
    }

    #[test]
    fn epoch_is_a_real_timestamp() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("epoch.txt");
        fs::write(&file, b"").expect("write file");

        let epoch = FileTime::from_unix_time(0, 0);
        let requested = Timestamps::none().with_accessed(epoch).with_modified(epoch);
        write_times(&PosixPlatform, &file, &requested).expect("write");
        assert_eq!(read_times(&PosixPlatform, &file).expect("read").modified, epoch);
    }
}
