//! File operations delegated to the host: rename and open.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::host::Host;

/// Characters rejected in new names on every platform.
const RESERVED_CHARS: [char; 10] = ['*', '"', '<', '>', ':', '?', '|', '/', '\\', '\0'];

/// Renames a file or directory within its parent directory.
///
/// `new_name` is trimmed first. Renaming to the current name is a successful
/// no-op. Returns the path the entry now lives at.
///
/// # Errors
///
/// - [`CoreError::InvalidName`] if the trimmed name is empty, `.`/`..`, or
///   contains a separator or reserved character.
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::AlreadyExists`] if another entry already has that name.
/// - Whatever the host reports for the rename itself.
pub async fn rename_entry<H: Host + ?Sized>(
    host: &H,
    path: &Path,
    new_name: &str,
) -> CoreResult<PathBuf> {
    let name = new_name.trim();
    if !is_valid_filename(name) {
        return Err(CoreError::InvalidName(new_name.to_string()));
    }

    let new_path = sibling(path, name)
        .ok_or_else(|| CoreError::InvalidName("no parent directory".to_string()))?;
    if new_path == path {
        return Ok(new_path);
    }

    if !host.exists(path).await {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if host.exists(&new_path).await {
        return Err(CoreError::AlreadyExists(new_path));
    }

    host.rename(path, &new_path).await?;
    tracing::debug!("renamed {} -> {}", path.display(), new_path.display());
    Ok(new_path)
}

/// Replaces the last component of `path` with `name`, keeping whatever
/// separator the path already uses so drive paths stay backslash-separated
/// on any host.
fn sibling(path: &Path, name: &str) -> Option<PathBuf> {
    let text = path.to_string_lossy();
    let bytes = text.as_bytes();
    let windows_style = text.starts_with("\\\\") || (bytes.len() >= 2 && bytes[1] == b':');
    let seps: &[char] = if windows_style { &['\\', '/'] } else { &['/'] };
    let trimmed = text.trim_end_matches(seps);
    let cut = trimmed.rfind(seps)?;
    Some(PathBuf::from(format!("{}{name}", &trimmed[..=cut])))
}

/// Opens `path` with the platform's default application.
pub async fn open_entry<H: Host + ?Sized>(host: &H, path: &Path) -> CoreResult<()> {
    host.open_path(path).await
}

/// Returns `true` if `name` can be used as a single path component.
pub fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    !name.contains(RESERVED_CHARS)
}
