//! Single-level directory listing.

use std::cmp::Ordering;

use crate::error::CoreResult;
use crate::fs::entry::DirectoryEntry;
use crate::fs::path::CanonicalPath;
use crate::host::Host;

/// Reads the immediate children of `dir` through `host`.
///
/// Kind comes from the enumeration itself; size and modification time come
/// from a per-child `stat`. A failed `stat` never fails the listing: the
/// entry is kept with its size and timestamp absent. The result is in base
/// order (see [`sort_listing`]).
///
/// # Errors
///
/// Whatever `host.read_dir` reports when the directory cannot be enumerated
/// at all: [`crate::CoreError::NotFound`], [`crate::CoreError::PermissionDenied`],
/// [`crate::CoreError::NotADirectory`] or [`crate::CoreError::Unreadable`].
pub async fn list_directory<H: Host + ?Sized>(
    host: &H,
    dir: &CanonicalPath,
) -> CoreResult<Vec<DirectoryEntry>> {
    let children = host.read_dir(dir.as_path()).await?;

    let mut entries = Vec::with_capacity(children.len());
    for child in children {
        if matches!(child.name.as_str(), "" | "." | "..") {
            continue;
        }
        let path = dir.join(&child.name);
        let (size, modified) = match host.stat(path.as_path()).await {
            Ok(stat) => (Some(stat.size), stat.modified),
            Err(e) => {
                tracing::trace!("stat failed for {path}: {e}");
                (None, None)
            }
        };
        entries.push(DirectoryEntry::new(path, child.is_dir, size, modified));
    }

    sort_listing(&mut entries);
    Ok(entries)
}

/// Base ordering: directories first, then name ascending ignoring case.
///
/// Names equal except for case fall back to a case-sensitive comparison so
/// the order is total and repeatable.
pub fn sort_listing(entries: &mut [DirectoryEntry]) {
    entries.sort_by(compare_base);
}

fn compare_base(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| compare_names(a.name(), b.name()))
}

/// Case-insensitive name comparison with a case-sensitive tiebreak.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
