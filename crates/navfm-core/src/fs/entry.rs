//! Directory entry representation.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use unicode_normalization::UnicodeNormalization;

use crate::fs::path::CanonicalPath;

/// A single child of a listed directory.
///
/// `DirectoryEntry` is immutable. `size` is only ever present for files:
/// it is `None` for directories and for files whose metadata could not be
/// read. `modified` is `None` whenever the timestamp is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    name: String,
    path: CanonicalPath,
    is_directory: bool,
    size: Option<u64>,
    #[serde(rename = "modifiedAt", serialize_with = "serialize_millis")]
    modified: Option<SystemTime>,
}

impl DirectoryEntry {
    /// Creates an entry for `path`.
    ///
    /// The name is taken from the last path segment and NFC-normalised.
    /// Any `size` passed for a directory is dropped.
    pub fn new(
        path: CanonicalPath,
        is_directory: bool,
        size: Option<u64>,
        modified: Option<SystemTime>,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| n.nfc().collect::<String>())
            .unwrap_or_else(|| path.as_str().to_string());
        Self {
            name,
            path,
            is_directory,
            size: if is_directory { None } else { size },
            modified,
        }
    }

    /// Returns the base name (no path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the canonical path of this entry.
    pub fn path(&self) -> &CanonicalPath {
        &self.path
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_directory
    }

    /// File size in bytes; `None` for directories or unknown sizes.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Last-modified time, if available.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Last-modified time as milliseconds since the Unix epoch.
    pub fn modified_ms(&self) -> Option<i64> {
        self.modified.map(system_time_millis)
    }

    /// Returns `true` if the name starts with `.`.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Lowercased text after the last `.` of the name, if any.
    ///
    /// A leading dot alone (`.bashrc`) is not an extension.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

fn serialize_millis<S: Serializer>(
    value: &Option<SystemTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(time) => serializer.serialize_some(&system_time_millis(*time)),
        None => serializer.serialize_none(),
    }
}
