//! Plain-text formatting of listings and roots.

use std::time::{Duration, SystemTime};

use navfm_core::fs::path::{breadcrumbs, CanonicalPath};
use navfm_core::nav::filter::{display_name, ViewPreferences};
use navfm_core::{DirectoryEntry, DriveRoot};

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

fn format_age(modified: SystemTime, now: SystemTime) -> String {
    let elapsed = now.duration_since(modified).unwrap_or(Duration::ZERO);
    let secs = elapsed.as_secs();
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// One listing row: size column, age column, then the display name.
/// Directories end in a `/`.
pub fn entry_line(entry: &DirectoryEntry, prefs: &ViewPreferences, now: SystemTime) -> String {
    let size = match (entry.is_dir(), entry.size()) {
        (true, _) => "<dir>".to_owned(),
        (false, Some(size)) => format_size(size),
        (false, None) => "?".to_owned(),
    };
    let age = entry
        .modified()
        .map(|m| format_age(m, now))
        .unwrap_or_else(|| "-".to_owned());
    let mut name = display_name(entry, prefs).to_owned();
    if entry.is_dir() {
        name.push('/');
    }
    format!("{size:>10}  {age:>8}  {name}")
}

/// `C: › Users › me` style trail.
pub fn trail(path: &CanonicalPath) -> String {
    breadcrumbs(path)
        .into_iter()
        .map(|crumb| crumb.name)
        .collect::<Vec<_>>()
        .join(" › ")
}

pub fn root_line(root: &DriveRoot) -> String {
    match (root.free_bytes, root.total_bytes) {
        (Some(free), Some(total)) => format!(
            "{:<6} {}  {} free of {}",
            root.label,
            root.root_path,
            format_size(free),
            format_size(total)
        ),
        _ => format!("{:<6} {}", root.label, root.root_path),
    }
}
