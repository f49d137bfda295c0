//! JSON Lines manifests.
//!
//! Each non-blank line not starting with `#` is one object:
//!
//! ```text
//! {"path": "docs/a.txt", "attributes": {"file-mtime": "2023-11-14T22:13:20Z", "file-owner": "1000"}}
//! {"path": "docs/b.txt", "mtime": 1700000000, "owner": "1000", "group": "1000"}
//! ```
//!
//! Short fields (`atime`, `mtime`, `ctime`, `owner`, `group`) override the
//! matching entries of `attributes`. Values may be strings or numbers.

use metadata::MetadataRecord;
use metadata::attributes::{ATIME, CTIME, GROUP, MTIME, OWNER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A manifest line that could not be turned into a record.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The line is not a valid manifest object.
    #[error("manifest line {line}: {source}")]
    Syntax {
        /// One-based line number.
        line: usize,
        /// Underlying failure.
        source: serde_json::Error,
    },
    /// The object parsed but holds an invalid attribute value.
    #[error("manifest line {line}: {source}")]
    Record {
        /// One-based line number.
        line: usize,
        /// Underlying failure.
        source: metadata::MetadataError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => number.fmt(f),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Line {
    path: PathBuf,
    #[serde(default)]
    attributes: BTreeMap<String, Scalar>,
    atime: Option<Scalar>,
    mtime: Option<Scalar>,
    ctime: Option<Scalar>,
    owner: Option<Scalar>,
    group: Option<Scalar>,
}

impl Line {
    fn into_record(self) -> Result<MetadataRecord, metadata::MetadataError> {
        let mut pairs: Vec<(String, String)> = self
            .attributes
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        let direct = [
            (ATIME, self.atime),
            (MTIME, self.mtime),
            (CTIME, self.ctime),
            (OWNER, self.owner),
            (GROUP, self.group),
        ];
        pairs.extend(
            direct
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value.to_string()))),
        );

        MetadataRecord::from_attributes(
            self.path,
            pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())),
        )
    }
}

/// Records read from a manifest, plus the lines that were rejected.
#[derive(Debug, Default)]
pub struct Manifest {
    /// Valid records in file order.
    pub records: Vec<MetadataRecord>,
    /// Rejected lines in file order.
    pub rejected: Vec<ManifestError>,
}

impl Manifest {
    /// Reads a manifest, collecting invalid lines instead of stopping at them.
    ///
    /// # Errors
    ///
    /// Only I/O failures of `reader` are returned.
    pub fn read<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut manifest = Self::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let number = index + 1;
            let parsed = serde_json::from_str::<Line>(text)
                .map_err(|source| ManifestError::Syntax {
                    line: number,
                    source,
                })
                .and_then(|line| {
                    line.into_record().map_err(|source| ManifestError::Record {
                        line: number,
                        source,
                    })
                });
            match parsed {
                Ok(record) => manifest.records.push(record),
                Err(error) => manifest.rejected.push(error),
            }
        }
        Ok(manifest)
    }
}

#[derive(Serialize)]
struct CapturedLine<'a> {
    path: &'a Path,
    attributes: BTreeMap<String, String>,
}

/// Writes `record` as one manifest line.
///
/// # Errors
///
/// Fails when the path is not valid UTF-8 or `out` fails.
pub fn write_record<W: Write>(out: &mut W, record: &MetadataRecord) -> io::Result<()> {
    let line = CapturedLine {
        path: record.path(),
        attributes: record.to_attributes(),
    };
    serde_json::to_writer(&mut *out, &line)?;
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;

    fn read(text: &str) -> Manifest {
        Manifest::read(text.as_bytes()).expect("in-memory read")
    }

    #[test]
    fn attribute_and_short_forms_are_accepted() {
        let manifest = read(concat!(
            "# captured 2023-11-14\n",
            "\n",
            r#"{"path": "a.txt", "attributes": {"file-mtime": "2023-11-14T22:13:20Z", "file-owner": "1000", "ContentType": "text/plain"}}"#,
            "\n",
            r#"{"path": "b.txt", "mtime": 1700000000.5, "group": 20}"#,
            "\n",
        ));

        assert!(manifest.rejected.is_empty());
        let [a, b] = manifest.records.as_slice() else {
            panic!("expected two records");
        };
        assert_eq!(a.times().modified, Some(FileTime::from_unix_time(1_700_000_000, 0)));
        assert_eq!(a.owner(), Some("1000"));
        assert_eq!(
            b.times().modified,
            Some(FileTime::from_unix_time(1_700_000_000, 500_000_000))
        );
        assert_eq!(b.group(), Some("20"));
        assert_eq!(b.owner(), None);
    }

    #[test]
    fn short_fields_override_attributes() {
        let manifest = read(r#"{"path": "f", "attributes": {"file-owner": "1"}, "owner": "2"}"#);
        assert_eq!(manifest.records[0].owner(), Some("2"));
    }

    #[test]
    fn invalid_lines_are_rejected_with_line_numbers() {
        let manifest = read(concat!(
            r#"{"path": "ok"}"#,
            "\n",
            "not json\n",
            r#"{"path": "bad", "mtime": "yesterday"}"#,
            "\n",
            r#"{"path": "typo", "mtiem": 1}"#,
            "\n",
        ));

        assert_eq!(manifest.records.len(), 1);
        let messages: Vec<String> = manifest.rejected.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("manifest line 2:"));
        assert!(messages[1].starts_with("manifest line 3:"));
        assert!(messages[1].contains("file-mtime"));
        assert!(messages[2].contains("mtiem"));
    }

    #[test]
    fn written_lines_read_back() {
        let record = MetadataRecord::new("dir/file")
            .with_times(
                metadata::Timestamps::none().with_modified(FileTime::from_unix_time(1_700_000_000, 0)),
            )
            .with_owner("0");
        let mut out = Vec::new();
        write_record(&mut out, &record).expect("write");

        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(
            text,
            "{\"path\":\"dir/file\",\"attributes\":{\"file-mtime\":\"2023-11-14T22:13:20Z\",\"file-owner\":\"0\"}}\n"
        );
        assert_eq!(read(&text).records, [record]);
    }
}
