//! Restoring whole records and batches of records.
//!
//! A [`RestoreSession`] owns one platform instance, one
//! [`PropagationCoordinator`], and the [`RestoreOptions`] for a run. Sharing
//! the session by reference shares the dedup gate, so every record in a batch
//! (sequential or parallel) sees the ancestors handled by the others.

use crate::backend::{MetadataPlatform, NativePlatform};
use crate::error::MetadataError;
use crate::identity::{IdentityKind, translate_pair};
use crate::options::RestoreOptions;
use crate::propagate::{PropagationCoordinator, PropagationStats};
use crate::record::{MetadataRecord, Timestamps};
use crate::times::write_times;
use logging::trace_batch;
use std::path::{Path, PathBuf};

/// What restoring one record changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// A timestamp write reached the filesystem.
    pub times_written: bool,
    /// Ownership propagation counters.
    pub ownership: PropagationStats,
}

/// Summary of a batch restore.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records restored without error.
    pub restored: usize,
    /// Records whose timestamps were written.
    pub times_written: usize,
    /// Ownership propagation counters summed over the batch.
    pub ownership: PropagationStats,
    /// Records that failed, with the failure.
    pub failures: Vec<(PathBuf, MetadataError)>,
}

impl BatchReport {
    /// Returns `true` when every record was restored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, path: &Path, result: Result<RestoreOutcome, MetadataError>) {
        match result {
            Ok(outcome) => {
                self.restored += 1;
                self.times_written += usize::from(outcome.times_written);
                self.ownership.absorb(outcome.ownership);
            }
            Err(error) => {
                tracing::debug!(target: "metarestore::batch", %error, "record not restored");
                self.failures.push((path.to_path_buf(), error));
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn merge(mut self, other: Self) -> Self {
        self.restored += other.restored;
        self.times_written += other.times_written;
        self.ownership.absorb(other.ownership);
        self.failures.extend(other.failures);
        self
    }
}

/// Restores recorded metadata onto files through one platform.
#[derive(Debug)]
pub struct RestoreSession<P: MetadataPlatform = NativePlatform> {
    platform: P,
    coordinator: PropagationCoordinator,
    options: RestoreOptions,
}

impl RestoreSession<NativePlatform> {
    /// Creates a session using the build target's platform.
    #[must_use]
    pub fn native(options: RestoreOptions) -> Self {
        Self::new(NativePlatform::default(), options)
    }
}

impl<P: MetadataPlatform> RestoreSession<P> {
    /// Creates a session restoring through `platform`.
    #[must_use]
    pub fn new(platform: P, options: RestoreOptions) -> Self {
        let coordinator = PropagationCoordinator::new(options.grant())
            .with_ancestors(options.ancestors())
            .with_boundary(options.root_dir());
        Self {
            platform,
            coordinator,
            options,
        }
    }

    /// The platform restores go through.
    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// The coordinator holding the processed-path set.
    #[must_use]
    pub const fn coordinator(&self) -> &PropagationCoordinator {
        &self.coordinator
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &RestoreOptions {
        &self.options
    }

    /// Restores one record: timestamps first, then ownership.
    ///
    /// The path is checked against the destination and identities are
    /// translated before anything is written, so an escaping path or a
    /// malformed owner leaves the filesystem untouched.
    ///
    /// # Errors
    ///
    /// The first failure on any axis; later axes are not attempted.
    pub fn restore(&self, record: &MetadataRecord) -> Result<RestoreOutcome, MetadataError> {
        let path = self.options.resolve(record.path())?;

        let (owner, group) = if self.options.ownership() {
            translate_pair(&self.platform, record.owner(), record.group())
                .map_err(|error| error.with_path(&path))?
        } else {
            (None, None)
        };

        let times_written = if self.options.times() {
            write_times(&self.platform, &path, record.times())?.is_some()
        } else {
            false
        };

        let ownership = self.coordinator.propagate_principals(
            &self.platform,
            &path,
            owner.as_ref(),
            group.as_ref(),
        )?;

        Ok(RestoreOutcome {
            times_written,
            ownership,
        })
    }

    /// Restores every record, continuing past failures.
    pub fn restore_batch<'a, I>(&self, records: I) -> BatchReport
    where
        I: IntoIterator<Item = &'a MetadataRecord>,
    {
        let mut report = BatchReport::default();
        for record in records {
            report.record(record.path(), self.restore(record));
        }
        trace_batch!(
            restored = report.restored,
            failed = report.failures.len(),
            "batch complete"
        );
        report
    }

    /// Restores `records` across the rayon thread pool, continuing past failures.
    ///
    /// Records are independent except for the shared processed-path set, so
    /// each ancestor is still handled exactly once.
    #[cfg(feature = "parallel")]
    pub fn restore_batch_parallel(&self, records: &[MetadataRecord]) -> BatchReport {
        use rayon::prelude::*;

        let report = records
            .par_iter()
            .fold(BatchReport::default, |mut report, record| {
                report.record(record.path(), self.restore(record));
                report
            })
            .reduce(BatchReport::default, BatchReport::merge);
        trace_batch!(
            restored = report.restored,
            failed = report.failures.len(),
            "parallel batch complete"
        );
        report
    }

    /// Captures the current timestamps and ownership of `path` as a record.
    ///
    /// # Errors
    ///
    /// Fails when `path` leaves the destination or cannot be inspected.
    pub fn capture(&self, path: &Path) -> Result<MetadataRecord, MetadataError> {
        let resolved = self.options.resolve(path)?;
        let times = self.platform.read_times(&resolved)?;
        let (owner, group) = self.platform.read_owner_group(&resolved)?;
        Ok(MetadataRecord::new(path)
            .with_times(Timestamps::from(times))
            .with_owner(self.platform.principal_to_string(&owner))
            .with_group(self.platform.principal_to_string(&group)))
    }

    /// Resolves the account name of a recorded identity.
    ///
    /// # Errors
    ///
    /// As for [`crate::identity::resolve_display_name`].
    pub fn display_name(&self, identity: &str, kind: IdentityKind) -> Result<String, MetadataError> {
        crate::identity::resolve_display_name(&self.platform, identity, kind)
    }
}
