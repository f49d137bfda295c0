//! Object-store attribute keys and their mapping onto [`MetadataRecord`].
//!
//! Timestamps are stored as RFC 3339 strings on capture. Decimal Unix seconds
//! with an optional fraction (`"1700000000.25"`) are also accepted when
//! reading so records produced by other tools restore cleanly. Keys are
//! matched without regard to ASCII case because object stores commonly
//! lower-case user metadata.

use crate::error::MetadataError;
use crate::record::{MetadataRecord, Timestamps};
use filetime::FileTime;
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Creation time attribute.
pub const CTIME: &str = "file-ctime";
/// Modification time attribute.
pub const MTIME: &str = "file-mtime";
/// Access time attribute.
pub const ATIME: &str = "file-atime";
/// Owner identity attribute.
pub const OWNER: &str = "file-owner";
/// Group identity attribute.
pub const GROUP: &str = "file-group";
/// Canned access-control setting of the stored object.
pub const ACL: &str = "ACL";
/// HTTP cache control header of the stored object.
pub const CACHE_CONTROL: &str = "CacheControl";
/// HTTP expiry header of the stored object.
pub const EXPIRES: &str = "Expires";
/// Storage tier of the stored object.
pub const STORAGE_CLASS: &str = "StorageClass";
/// MIME type of the stored object.
pub const CONTENT_TYPE: &str = "ContentType";
/// Server-side encryption algorithm of the stored object.
pub const ENCRYPTION_METHOD: &str = "EncryptionMethod";
/// Server-side encryption key id of the stored object.
pub const ENCRYPTION_KEY_ID: &str = "EncryptionKeyID";
/// Content encoding header of the stored object.
pub const CONTENT_ENCODING: &str = "ContentEncoding";

/// Keys restored onto the local filesystem.
pub const FILE_KEYS: [&str; 5] = [CTIME, MTIME, ATIME, OWNER, GROUP];

/// Keys describing the stored object itself; carried through but never
/// applied to local files.
pub const OBJECT_KEYS: [&str; 8] = [
    ACL,
    CACHE_CONTROL,
    EXPIRES,
    STORAGE_CLASS,
    CONTENT_TYPE,
    ENCRYPTION_METHOD,
    ENCRYPTION_KEY_ID,
    CONTENT_ENCODING,
];

/// Parses a recorded timestamp value.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidTimestamp`](crate::ErrorKind::InvalidTimestamp)
/// when `value` is neither RFC 3339 nor decimal Unix seconds.
pub fn parse_time(key: &str, value: &str) -> Result<FileTime, MetadataError> {
    let value = value.trim();
    if value.contains(['T', 't']) {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|error| MetadataError::invalid_timestamp(key, value, error))?;
        return Ok(FileTime::from_unix_time(
            parsed.unix_timestamp(),
            parsed.nanosecond(),
        ));
    }
    parse_unix_seconds(value).ok_or_else(|| {
        MetadataError::invalid_timestamp(key, value, "expected RFC 3339 or Unix seconds")
    })
}

/// Formats a timestamp as RFC 3339 in UTC.
///
/// Instants outside the calendar range fall back to decimal Unix seconds.
#[must_use]
pub fn format_time(time: FileTime) -> String {
    let nanos = i128::from(time.unix_seconds()) * 1_000_000_000 + i128::from(time.nanoseconds());
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .unwrap_or_else(|| format_unix_seconds(time))
}

// Inverse of `parse_unix_seconds`: the fraction carries the sign of the whole value.
fn format_unix_seconds(time: FileTime) -> String {
    let (seconds, nanos) = (time.unix_seconds(), time.nanoseconds());
    if seconds < 0 && nanos > 0 {
        format!("-{}.{:09}", -(seconds + 1), 1_000_000_000 - nanos)
    } else {
        format!("{seconds}.{nanos:09}")
    }
}

fn parse_unix_seconds(value: &str) -> Option<FileTime> {
    let (whole, fraction) = match value.split_once('.') {
        Some((_, "")) => return None,
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    if whole.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seconds: i64 = whole.parse().ok()?;
    let nanos = if fraction.is_empty() {
        0
    } else {
        let digits: u32 = fraction.parse().ok()?;
        digits * 10u32.pow(9 - fraction.len() as u32)
    };
    if whole.starts_with('-') && nanos > 0 {
        return Some(FileTime::from_unix_time(seconds.checked_sub(1)?, 1_000_000_000 - nanos));
    }
    Some(FileTime::from_unix_time(seconds, nanos))
}

impl MetadataRecord {
    /// Builds a record for `path` from attribute key/value pairs.
    ///
    /// Unknown keys and object-level keys are ignored. Later duplicates of a
    /// key override earlier ones.
    ///
    /// # Errors
    ///
    /// Fails when a timestamp attribute cannot be parsed.
    pub fn from_attributes<'a, I>(path: impl Into<PathBuf>, attributes: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let path = path.into();
        let mut times = Timestamps::none();
        let mut record = Self::new(path.clone());

        for (key, value) in attributes {
            let matches = |name: &str| key.eq_ignore_ascii_case(name);
            if matches(ATIME) {
                times.accessed = Some(parse_time(key, value).map_err(|e| e.with_path(&path))?);
            } else if matches(MTIME) {
                times.modified = Some(parse_time(key, value).map_err(|e| e.with_path(&path))?);
            } else if matches(CTIME) {
                times.created = Some(parse_time(key, value).map_err(|e| e.with_path(&path))?);
            } else if matches(OWNER) {
                record = record.with_owner(value);
            } else if matches(GROUP) {
                record = record.with_group(value);
            }
        }

        Ok(record.with_times(times))
    }

    /// Renders the record's file attributes, omitting absent fields.
    #[must_use]
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        let times = self.times();
        let mut attributes = BTreeMap::new();
        for (key, value) in [(ATIME, times.accessed), (MTIME, times.modified), (CTIME, times.created)] {
            if let Some(value) = value {
                attributes.insert(key.to_owned(), format_time(value));
            }
        }
        if let Some(owner) = self.owner() {
            attributes.insert(OWNER.to_owned(), owner.to_owned());
        }
        if let Some(group) = self.group() {
            attributes.insert(GROUP.to_owned(), group.to_owned());
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::Path;

    #[test]
    fn rfc3339_with_fraction_is_parsed() {
        let time = parse_time(MTIME, "2023-11-14T22:13:20.5Z").expect("valid");
        assert_eq!(time, FileTime::from_unix_time(1_700_000_000, 500_000_000));
    }

    #[test]
    fn rfc3339_offset_is_normalised() {
        let time = parse_time(MTIME, "2023-11-15T00:13:20+02:00").expect("valid");
        assert_eq!(time.unix_seconds(), 1_700_000_000);
    }

    #[test]
    fn unix_seconds_with_fraction_are_parsed() {
        let time = parse_time(ATIME, "1700000000.25").expect("valid");
        assert_eq!(time, FileTime::from_unix_time(1_700_000_000, 250_000_000));
    }

    #[test]
    fn negative_fraction_rounds_toward_negative_infinity() {
        let time = parse_time(ATIME, "-1.5").expect("valid");
        assert_eq!(time, FileTime::from_unix_time(-2, 500_000_000));
    }

    #[test]
    fn malformed_values_are_rejected() {
        for value in [
            "",
            "yesterday",
            "12.",
            "1.1234567891",
            "2023-13-01T00:00:00Z",
            "-9223372036854775808.5",
        ] {
            let error = parse_time(MTIME, value).expect_err(value);
            assert_eq!(error.kind(), ErrorKind::InvalidTimestamp, "{value}");
        }
    }

    #[test]
    fn out_of_calendar_times_keep_their_sign() {
        let before = FileTime::from_unix_time(-1_000_000_000_000, 5);
        let rendered = format_time(before);
        assert_eq!(rendered, "-999999999999.999999995");
        assert_eq!(parse_time(MTIME, &rendered).expect("parses back"), before);

        let after = FileTime::from_unix_time(1_000_000_000_000, 5);
        assert_eq!(format_time(after), "1000000000000.000000005");
        assert_eq!(parse_time(MTIME, &format_time(after)).expect("parses back"), after);
    }

    #[test]
    fn attributes_populate_record() {
        let record = MetadataRecord::from_attributes(
            "docs/readme.txt",
            [
                ("File-Mtime", "1700000000"),
                ("file-owner", "1000"),
                ("file-group", ""),
                ("ContentType", "text/plain"),
            ],
        )
        .expect("valid attributes");

        assert_eq!(record.path(), Path::new("docs/readme.txt"));
        assert_eq!(record.times().modified, Some(FileTime::from_unix_time(1_700_000_000, 0)));
        assert_eq!(record.times().accessed, None);
        assert_eq!(record.owner(), Some("1000"));
        assert_eq!(record.group(), None);
    }

    #[test]
    fn bad_timestamp_reports_record_path() {
        let error = MetadataRecord::from_attributes("x/y", [(CTIME, "soon")]).expect_err("invalid");
        assert_eq!(error.path(), Path::new("x/y"));
    }

    #[test]
    fn rendered_attributes_parse_back() {
        let record = MetadataRecord::new("f")
            .with_times(Timestamps::none().with_accessed(FileTime::from_unix_time(86_400, 1_000)))
            .with_group("staff");
        let attributes = record.to_attributes();
        assert_eq!(attributes.get(ATIME).map(String::as_str), Some("1970-01-02T00:00:00.000001Z"));
        assert!(!attributes.contains_key(MTIME));

        let parsed = MetadataRecord::from_attributes(
            "f",
            attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .expect("round trip");
        assert_eq!(parsed, record);
    }
}
