//! Whole-record restores through `RestoreSession`.

mod common;

use common::RecordingPlatform;
use filetime::FileTime;
use metadata::{ErrorKind, MetadataRecord, RestoreOptions, RestoreSession, Timestamps};
use std::path::{Path, PathBuf};

fn record(path: &str) -> MetadataRecord {
    MetadataRecord::new(path)
        .with_times(Timestamps::none().with_modified(FileTime::from_unix_time(1_700_000_000, 0)))
        .with_owner("1000")
        .with_group("1000")
}

#[test]
fn restore_writes_times_then_ownership() {
    let session = RestoreSession::new(RecordingPlatform::posix(), RestoreOptions::default());

    let outcome = session.restore(&record("/a/b/c.txt")).expect("restore");

    assert!(outcome.times_written);
    assert_eq!(outcome.ownership.applied, 3);
    assert_eq!(session.platform().writes()[0].0, PathBuf::from("/a/b/c.txt"));
}

#[test]
fn malformed_owner_leaves_file_untouched() {
    let session = RestoreSession::new(RecordingPlatform::posix(), RestoreOptions::default());
    let bad = record("/a/file").with_owner("alice");

    let error = session.restore(&bad).expect_err("not numeric");

    assert_eq!(error.kind(), ErrorKind::InvalidOwnershipFormat);
    assert_eq!(error.path(), Path::new("/a/file"));
    assert!(session.platform().writes().is_empty());
    assert_eq!(session.platform().ownership.total(), 0);
}

#[test]
fn disabled_axes_are_skipped() {
    let options = RestoreOptions::new().restore_times(false).restore_ownership(false);
    let session = RestoreSession::new(RecordingPlatform::posix(), options);

    // With ownership disabled the identity is never parsed.
    let outcome = session
        .restore(&record("/x").with_owner("alice"))
        .expect("nothing to do");

    assert_eq!(outcome, metadata::RestoreOutcome::default());
    assert!(session.platform().writes().is_empty());
}

#[test]
fn root_option_resolves_and_bounds_the_walk() {
    let options = RestoreOptions::new().root(Some(PathBuf::from("/dest")));
    let session = RestoreSession::new(RecordingPlatform::posix(), options);

    session.restore(&record("sub/file.txt")).expect("restore");

    let platform = session.platform();
    assert_eq!(platform.ownership.count("/dest/sub/file.txt"), 1);
    assert_eq!(platform.ownership.count("/dest/sub"), 1);
    assert_eq!(platform.ownership.count("/dest"), 0);
}

#[test]
fn record_escaping_root_is_rejected_untouched() {
    let options = RestoreOptions::new().root(Some(PathBuf::from("/dest")));
    let session = RestoreSession::new(RecordingPlatform::posix(), options);

    for path in ["../etc/passwd", "sub/../../etc/passwd", "/etc/passwd"] {
        let error = session.restore(&record(path)).expect_err(path);
        assert_eq!(error.kind(), ErrorKind::OutsideRoot, "{path}");
        assert_eq!(error.path(), Path::new(path));
    }

    let platform = session.platform();
    assert!(platform.writes().is_empty());
    assert_eq!(platform.ownership.total(), 0);
    assert!(session.coordinator().processed().is_empty());
}

#[test]
fn parent_components_inside_root_are_resolved() {
    let options = RestoreOptions::new().root(Some(PathBuf::from("/dest")));
    let session = RestoreSession::new(RecordingPlatform::posix(), options);

    session.restore(&record("a/../b/file.txt")).expect("stays inside root");

    let platform = session.platform();
    assert_eq!(platform.writes()[0].0, PathBuf::from("/dest/b/file.txt"));
    assert_eq!(platform.ownership.count("/dest/b/file.txt"), 1);
    assert_eq!(platform.ownership.count("/dest/b"), 1);
    assert_eq!(platform.ownership.count("/dest"), 0);
    assert_eq!(platform.ownership.count("/dest/a"), 0);
}

#[test]
fn batch_continues_past_failures() {
    let session = RestoreSession::new(RecordingPlatform::posix(), RestoreOptions::default());
    let records = [
        record("/a/one"),
        record("/a/two").with_group("staff"),
        record("/a/three"),
    ];

    let report = session.restore_batch(&records);

    assert_eq!(report.restored, 2);
    assert_eq!(report.times_written, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, PathBuf::from("/a/two"));
    assert!(!report.is_complete());
    // /a is shared by both successful records.
    assert_eq!(report.ownership.applied, 3);
    assert_eq!(report.ownership.skipped, 1);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batch_shares_the_processed_set() {
    let session = RestoreSession::new(RecordingPlatform::posix(), RestoreOptions::default());
    let records: Vec<_> = (0..64)
        .map(|index| record(&format!("/tree/d{}/f{index}", index % 4)))
        .collect();

    let report = session.restore_batch_parallel(&records);

    assert!(report.is_complete());
    assert_eq!(report.restored, 64);
    // 64 files, 4 directories, /tree.
    assert_eq!(session.platform().ownership.total(), 69);
    assert_eq!(report.ownership.applied, 69);
}

#[cfg(unix)]
mod posix {
    use super::*;
    use metadata::{IdentityKind, PosixPlatform};
    use std::fs;
    use test_support::TestTree;

    #[test]
    fn restore_on_real_file_sets_modification_time() {
        let tree = TestTree::new(&["docs/readme.txt"]).expect("tree");
        let options = RestoreOptions::new()
            .restore_ownership(false)
            .root(Some(tree.root().to_path_buf()));
        let session = RestoreSession::new(PosixPlatform, options);

        let outcome = session.restore(&record("docs/readme.txt")).expect("restore");

        assert!(outcome.times_written);
        let metadata = fs::metadata(tree.path("docs/readme.txt")).expect("stat");
        assert_eq!(
            FileTime::from_last_modification_time(&metadata),
            FileTime::from_unix_time(1_700_000_000, 0)
        );
    }

    #[test]
    fn capture_reports_current_state() {
        let tree = TestTree::new(&["file.bin"]).expect("tree");
        let session = RestoreSession::native(RestoreOptions::default());
        let path = tree.path("file.bin");
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_234_567_890, 0)).expect("mtime");

        let captured = session.capture(&path).expect("capture");

        let metadata = fs::metadata(&path).expect("stat");
        use std::os::unix::fs::MetadataExt;
        assert_eq!(captured.owner(), Some(metadata.uid().to_string().as_str()));
        assert_eq!(captured.group(), Some(metadata.gid().to_string().as_str()));
        assert_eq!(
            captured.times().modified,
            Some(FileTime::from_unix_time(1_234_567_890, 0))
        );
    }

    #[test]
    fn restoring_a_capture_is_stable() {
        let tree = TestTree::new(&["a/b/c.txt"]).expect("tree");
        let (uid, gid) = platform::accounts::effective_ids();
        let options = RestoreOptions::new().root(Some(tree.root().to_path_buf()));
        let session = RestoreSession::new(PosixPlatform, options);
        let record = MetadataRecord::new("a/b/c.txt")
            .with_owner(uid.to_string())
            .with_group(gid.to_string());

        let outcome = session.restore(&record).expect("chown to self");

        assert_eq!(outcome.ownership.applied, 3);
        assert!(session.coordinator().processed().contains(&tree.path("a")));
        assert!(!session.coordinator().processed().contains(tree.root()));
    }

    #[test]
    fn missing_file_is_not_found() {
        let tree = TestTree::new(&[]).expect("tree");
        let options = RestoreOptions::new().root(Some(tree.root().to_path_buf()));
        let session = RestoreSession::new(PosixPlatform, options);

        let error = session.restore(&record("ghost.txt")).expect_err("missing");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn chown_to_other_user_requires_root() {
        if !platform::accounts::is_superuser() {
            return;
        }
        let tree = TestTree::new(&["owned/file"]).expect("tree");
        let options = RestoreOptions::new().root(Some(tree.root().to_path_buf()));
        let session = RestoreSession::new(PosixPlatform, options);

        session
            .restore(&MetadataRecord::new("owned/file").with_owner("4242").with_group("4343"))
            .expect("root can chown");

        use std::os::unix::fs::MetadataExt;
        for path in ["owned/file", "owned"] {
            let metadata = fs::metadata(tree.path(path)).expect("stat");
            assert_eq!((metadata.uid(), metadata.gid()), (4242, 4343), "{path}");
        }
        assert_eq!(fs::metadata(tree.root()).expect("stat").uid(), 0);
    }

    #[test]
    fn display_name_of_root() {
        let session = RestoreSession::native(RestoreOptions::default());
        assert_eq!(session.display_name("0", IdentityKind::Owner).expect("root"), "root");
    }
}
