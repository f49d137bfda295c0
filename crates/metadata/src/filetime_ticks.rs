//! Conversions between [`FileTime`] and Windows FILETIME ticks.
//!
//! A FILETIME counts 100 ns intervals since 1601-01-01 UTC. The arithmetic is
//! kept platform independent so it is tested on every host.

use filetime::FileTime;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// FILETIME ticks per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// FILETIME tick value of 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: u64 = 116_444_736_000_000_000;

const NANOS_PER_TICK: u32 = 100;

/// Converts FILETIME ticks to a [`FileTime`].
#[must_use]
pub fn from_ticks(ticks: u64) -> FileTime {
    let relative = i128::from(ticks) - i128::from(UNIX_EPOCH_TICKS);
    let per_second = i128::from(TICKS_PER_SECOND);
    let seconds = relative.div_euclid(per_second);
    let remainder = relative.rem_euclid(per_second);
    // |seconds| < 2^64 / 10^7, and remainder < 10^7.
    FileTime::from_unix_time(
        seconds as i64,
        remainder as u32 * NANOS_PER_TICK,
    )
}

/// Converts a [`FileTime`] to FILETIME ticks, truncating to 100 ns.
///
/// Returns `None` for instants before 1601 or past the end of the tick range.
#[must_use]
pub fn to_ticks(time: FileTime) -> Option<u64> {
    let ticks = i128::from(time.unix_seconds()) * i128::from(TICKS_PER_SECOND)
        + i128::from(time.nanoseconds() / NANOS_PER_TICK)
        + i128::from(UNIX_EPOCH_TICKS);
    u64::try_from(ticks).ok()
}

/// Converts a [`FileTime`] to a [`SystemTime`], or `None` if it is not representable.
#[must_use]
pub fn to_system_time(time: FileTime) -> Option<SystemTime> {
    let seconds = time.unix_seconds();
    let nanos = Duration::from_nanos(u64::from(time.nanoseconds()));
    if seconds >= 0 {
        UNIX_EPOCH
            .checked_add(Duration::from_secs(seconds.unsigned_abs()))?
            .checked_add(nanos)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(seconds.unsigned_abs()))?
            .checked_add(nanos)
    }
}
