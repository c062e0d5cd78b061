//! View projection: filtering, sorting and display names for a listing.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fs::entry::DirectoryEntry;

/// The field by which entries are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Alphabetical, ignoring case.
    #[default]
    Name,
    /// File size in bytes; directories count as 0.
    Size,
    /// File extension, ignoring case; directories form their own lowest bucket.
    Type,
    /// Last-modified time; unknown times count as the epoch.
    #[serde(alias = "modified", alias = "modifiedAt")]
    Date,
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest / earliest / A–Z first.
    #[default]
    Ascending,
    /// Largest / latest / Z–A first.
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "size" => Ok(SortField::Size),
            "type" => Ok(SortField::Type),
            "date" | "modified" | "modifiedat" => Ok(SortField::Date),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::Type => "type",
            SortField::Date => "date",
        })
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        })
    }
}

/// User-controlled presentation settings for a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPreferences {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub group_directories_first: bool,
    pub show_hidden: bool,
    /// Lowercase extensions whose suffix is left out of display names.
    pub hide_known_extensions: BTreeSet<String>,
    /// Master switch for `hide_known_extensions`.
    pub hide_extensions: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            sort_field: SortField::Name,
            sort_direction: SortDirection::Ascending,
            group_directories_first: false,
            show_hidden: false,
            hide_known_extensions: ["lnk", "url", "exe"].iter().map(|e| e.to_string()).collect(),
            hide_extensions: true,
        }
    }
}

impl ViewPreferences {
    fn hides_extension(&self, ext: &str) -> bool {
        self.hide_extensions && self.hide_known_extensions.contains(ext)
    }
}

/// Produces the sequence a view should render from a raw listing.
///
/// Hidden entries are dropped unless `prefs.show_hidden`; then entries whose
/// name does not contain `search` (ignoring case) are dropped. The rest are
/// stably sorted, so entries with equal keys keep their listing order.
/// Returns a **new** `Vec`; the input is never mutated.
pub fn project(
    entries: &[DirectoryEntry],
    prefs: &ViewPreferences,
    search: &str,
) -> Vec<DirectoryEntry> {
    let needle = search.trim().to_lowercase();
    let mut out = filter_hidden(entries, prefs.show_hidden);
    if !needle.is_empty() {
        out.retain(|e| e.name().to_lowercase().contains(&needle));
    }

    out.sort_by(|a, b| {
        if prefs.group_directories_first {
            let dir_cmp = b.is_dir().cmp(&a.is_dir());
            if dir_cmp != Ordering::Equal {
                return dir_cmp;
            }
        }

        let ord = compare_by_field(a, b, prefs.sort_field);

        match prefs.sort_direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    out
}

/// Sort key for [`SortField::Type`]. Directories sort before any extension.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TypeKey {
    Directory,
    Extension(String),
}

fn type_key(entry: &DirectoryEntry) -> TypeKey {
    if entry.is_dir() {
        TypeKey::Directory
    } else {
        TypeKey::Extension(entry.extension().unwrap_or_default())
    }
}

fn effective_size(entry: &DirectoryEntry) -> u64 {
    if entry.is_dir() {
        0
    } else {
        entry.size().unwrap_or(0)
    }
}

fn compare_by_field(a: &DirectoryEntry, b: &DirectoryEntry, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortField::Size => effective_size(a).cmp(&effective_size(b)),
        SortField::Type => type_key(a).cmp(&type_key(b)),
        SortField::Date => a.modified_ms().unwrap_or(0).cmp(&b.modified_ms().unwrap_or(0)),
    }
}

/// Filters out hidden entries when `show_hidden` is `false`.
pub fn filter_hidden(entries: &[DirectoryEntry], show_hidden: bool) -> Vec<DirectoryEntry> {
    if show_hidden {
        return entries.to_vec();
    }
    entries.iter().filter(|e| !e.is_hidden()).cloned().collect()
}

/// The label a view shows for `entry`.
///
/// Files whose extension is in the hidden set are shown without it
/// (`"Game.lnk"` → `"Game"`). Directories are always shown in full.
pub fn display_name<'a>(entry: &'a DirectoryEntry, prefs: &ViewPreferences) -> &'a str {
    if entry.is_dir() {
        return entry.name();
    }
    match entry.extension() {
        Some(ext) if prefs.hides_extension(&ext) => entry
            .name()
            .rsplit_once('.')
            .map_or(entry.name(), |(stem, _)| stem),
        _ => entry.name(),
    }
}

/// Turns what the user typed into a rename box into the final file name.
///
/// The box starts from [`display_name`], so a typed name that drops the
/// file's extension gets it back. Returns `None` when the input is blank or
/// unchanged, meaning no rename should happen.
pub fn completed_rename(
    entry: &DirectoryEntry,
    input: &str,
    prefs: &ViewPreferences,
) -> Option<String> {
    let typed = input.trim();
    if typed.is_empty() || typed == display_name(entry, prefs) {
        return None;
    }
    if entry.is_dir() {
        return Some(typed.to_string());
    }
    let Some(ext) = entry.extension() else {
        return Some(typed.to_string());
    };
    if typed.to_lowercase().ends_with(&format!(".{ext}")) {
        return Some(typed.to_string());
    }
    // Keep the original spelling of the extension.
    let original_ext = entry
        .name()
        .rsplit_once('.')
        .map_or(ext.as_str(), |(_, e)| e);
    Some(format!("{typed}.{original_ext}"))
}
