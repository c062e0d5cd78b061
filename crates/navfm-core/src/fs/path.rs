//! Path resolution: turning user-typed or navigation-supplied strings into
//! canonical absolute directory references.
//!
//! Three root styles are recognised regardless of the host platform:
//!
//! - drive letters (`C:\`), written with `\` separators,
//! - UNC shares (`\\server\share`),
//! - POSIX paths (`/`), written with `/` separators.
//!
//! `.` and `..` segments are collapsed lexically; ascending above a root is
//! clamped at the root.

use std::fmt;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

/// The root style of a [`CanonicalPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStyle {
    /// `C:\...`
    Drive,
    /// `\\server\share\...`
    Unc,
    /// `/...`
    Posix,
}

impl PathStyle {
    /// The separator used when talking to the OS about paths of this style.
    pub fn separator(self) -> char {
        match self {
            PathStyle::Drive | PathStyle::Unc => '\\',
            PathStyle::Posix => '/',
        }
    }

    /// Whether comparisons between paths of this style ignore case.
    pub fn folds_case(self) -> bool {
        match self {
            PathStyle::Drive | PathStyle::Unc => true,
            PathStyle::Posix => cfg!(any(windows, target_os = "macos")),
        }
    }
}

/// An absolute, separator-normalised directory path.
///
/// Created through [`resolve`]. The text always uses the native separator
/// of its [`PathStyle`], carries no trailing separator except on a drive or
/// POSIX root, and contains no `.`/`..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    text: String,
    style: PathStyle,
    root_len: usize,
}

/// Resolves `raw` into a [`CanonicalPath`].
///
/// A bare drive reference (`"C:"`) becomes the drive root (`"C:\"`).
///
/// # Errors
///
/// [`CoreError::Resolution`] when `raw` is blank, relative, or an
/// incomplete UNC reference.
pub fn resolve(raw: &str) -> CoreResult<CanonicalPath> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Resolution("empty path".to_string()));
    }

    let bytes = trimmed.as_bytes();
    if is_drive_prefix(bytes) {
        let prefix = &trimmed[..2];
        let segments = collapse(trimmed[2..].split(['\\', '/']));
        let root = format!("{prefix}\\");
        return Ok(build(root, segments, PathStyle::Drive));
    }

    if trimmed.starts_with("\\\\") {
        let mut segments = collapse(trimmed[2..].split(['\\', '/'])).into_iter();
        let (Some(server), Some(share)) = (segments.next(), segments.next()) else {
            return Err(CoreError::Resolution(format!(
                "incomplete network path: {trimmed}"
            )));
        };
        let root = format!("\\\\{server}\\{share}");
        return Ok(build(root, segments.collect(), PathStyle::Unc));
    }

    if trimmed.starts_with('/') {
        let segments = collapse(trimmed.split('/'));
        return Ok(build("/".to_string(), segments, PathStyle::Posix));
    }

    Err(CoreError::Resolution(format!("not an absolute path: {trimmed}")))
}

fn is_drive_prefix(bytes: &[u8]) -> bool {
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'\\' || bytes[2] == b'/')
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in parts {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other.to_string()),
        }
    }
    out
}

fn build(root: String, segments: Vec<String>, style: PathStyle) -> CanonicalPath {
    let root_len = root.len();
    let sep = style.separator();
    let mut text = root;
    for (i, segment) in segments.iter().enumerate() {
        // Drive and POSIX roots already end in a separator; UNC roots do not.
        if i > 0 || style == PathStyle::Unc {
            text.push(sep);
        }
        text.push_str(segment);
    }
    CanonicalPath {
        text,
        style,
        root_len,
    }
}

impl CanonicalPath {
    /// The canonical text, using the native separator.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The canonical text as a [`Path`] for OS calls.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.text)
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Returns `true` for a drive root, UNC share root, or `/`.
    pub fn is_root(&self) -> bool {
        self.text.len() == self.root_len
    }

    /// Strips the last segment. Returns `None` when already at a root.
    pub fn parent(&self) -> Option<CanonicalPath> {
        if self.is_root() {
            return None;
        }
        let sep = self.style.separator();
        let cut = match self.text.rfind(sep) {
            Some(pos) if pos > self.root_len => pos,
            _ => self.root_len,
        };
        Some(CanonicalPath {
            text: self.text[..cut].to_string(),
            style: self.style,
            root_len: self.root_len,
        })
    }

    /// The last segment, or `None` at a root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        let sep = self.style.separator();
        let tail = &self.text[self.root_len..];
        Some(tail.rsplit(sep).next().unwrap_or(tail))
    }

    /// Appends a single child name.
    pub fn join(&self, name: &str) -> CanonicalPath {
        let sep = self.style.separator();
        let mut text = self.text.clone();
        if !text.ends_with(sep) {
            text.push(sep);
        }
        text.push_str(name);
        CanonicalPath {
            text,
            style: self.style,
            root_len: self.root_len,
        }
    }

    /// Separator- and (where the style calls for it) case-insensitive
    /// comparison against an arbitrary path string.
    pub fn same_location(&self, other: &str) -> bool {
        comparison_key(&self.text) == comparison_key(other)
    }

    /// Label shown for the root segment in breadcrumbs (`C:`, `/`, `\\srv\share`).
    fn root_label(&self) -> String {
        match self.style {
            PathStyle::Drive => self.text[..2].to_ascii_uppercase(),
            PathStyle::Unc => self.text[..self.root_len].to_string(),
            PathStyle::Posix => "/".to_string(),
        }
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl Serialize for CanonicalPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Normalised form used for "is this the active path" checks.
///
/// Separators become `/`, runs collapse, trailing separators are dropped,
/// and case is folded for drive-letter and UNC paths (and for POSIX paths
/// on case-insensitive hosts).
pub fn comparison_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let style = if is_drive_prefix(trimmed.as_bytes()) {
        PathStyle::Drive
    } else if trimmed.starts_with("\\\\") {
        PathStyle::Unc
    } else {
        PathStyle::Posix
    };

    let mut key = String::with_capacity(trimmed.len());
    if style == PathStyle::Unc {
        key.push_str("//");
    }
    let mut last_was_sep = style == PathStyle::Unc;
    for ch in trimmed.chars() {
        let is_sep = ch == '/' || (ch == '\\' && style != PathStyle::Posix);
        if is_sep {
            if !last_was_sep {
                key.push('/');
            }
            last_was_sep = true;
        } else {
            key.push(ch);
            last_was_sep = false;
        }
    }
    while key.len() > 1 && key.ends_with('/') {
        key.pop();
    }

    if style.folds_case() {
        key.to_lowercase()
    } else {
        key
    }
}

/// One clickable segment of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub path: CanonicalPath,
}

/// Splits `path` into breadcrumb segments, root first.
pub fn breadcrumbs(path: &CanonicalPath) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::new();
    let mut cursor = Some(path.clone());
    while let Some(current) = cursor {
        let name = match current.file_name() {
            Some(name) => name.to_string(),
            None => current.root_label(),
        };
        cursor = current.parent();
        crumbs.push(Breadcrumb {
            name,
            path: current,
        });
    }
    crumbs.reverse();
    crumbs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(raw: &str) -> CanonicalPath {
        resolve(raw).unwrap()
    }

    #[test]
    fn bare_drive_letter_becomes_root() {
        let path = r("C:");
        assert_eq!(path.as_str(), "C:\\");
        assert!(path.is_root());
        assert_eq!(path.style(), PathStyle::Drive);
    }

    #[test]
    fn drive_paths_use_backslash() {
        assert_eq!(r("C:/Users/me/").as_str(), "C:\\Users\\me");
        assert_eq!(r("D:\\\\Games\\\\").as_str(), "D:\\Games");
    }

    #[test]
    fn posix_paths_are_collapsed() {
        assert_eq!(r("/").as_str(), "/");
        assert_eq!(r("/home//me/").as_str(), "/home/me");
        assert_eq!(r("/home/./me/../you").as_str(), "/home/you");
        assert_eq!(r("/../..").as_str(), "/");
    }

    #[test]
    fn posix_backslash_is_a_name_character() {
        assert_eq!(r("/tmp/a\\b").as_str(), "/tmp/a\\b");
    }

    #[test]
    fn unc_paths_keep_share_as_root() {
        let path = r("\\\\server\\share\\docs");
        assert_eq!(path.as_str(), "\\\\server\\share\\docs");
        assert_eq!(path.parent().unwrap().as_str(), "\\\\server\\share");
        assert!(r("\\\\server\\share").is_root());
    }

    #[test]
    fn incomplete_unc_is_rejected() {
        assert!(matches!(
            resolve("\\\\server"),
            Err(CoreError::Resolution(_))
        ));
    }

    #[test]
    fn empty_and_relative_are_rejected() {
        assert!(matches!(resolve(""), Err(CoreError::Resolution(_))));
        assert!(matches!(resolve("   "), Err(CoreError::Resolution(_))));
        assert!(matches!(resolve("docs/a"), Err(CoreError::Resolution(_))));
        assert!(matches!(resolve("C:relative"), Err(CoreError::Resolution(_))));
    }

    #[test]
    fn parent_strips_last_segment() {
        assert_eq!(r("C:\\Users\\me").parent().unwrap().as_str(), "C:\\Users");
        assert_eq!(r("C:\\Users").parent().unwrap().as_str(), "C:\\");
        assert_eq!(r("/home/me").parent().unwrap().as_str(), "/home");
        assert_eq!(r("/home").parent().unwrap().as_str(), "/");
        assert_eq!(
            r("\\\\srv\\share\\x").parent().unwrap().as_str(),
            "\\\\srv\\share"
        );
    }

    #[test]
    fn parent_of_root_is_none() {
        assert!(r("C:\\").parent().is_none());
        assert!(r("c:").parent().is_none());
        assert!(r("/").parent().is_none());
        assert!(r("\\\\srv\\share").parent().is_none());
    }

    #[test]
    fn join_and_file_name() {
        let root = r("C:");
        let child = root.join("Windows");
        assert_eq!(child.as_str(), "C:\\Windows");
        assert_eq!(child.file_name(), Some("Windows"));
        assert_eq!(r("/").join("etc").as_str(), "/etc");
        assert_eq!(r("/etc").join("hosts").as_str(), "/etc/hosts");
        assert_eq!(root.file_name(), None);
    }

    #[test]
    fn drive_comparison_ignores_case_and_separators() {
        assert!(r("C:\\Users").same_location("c:/users"));
        assert!(r("C:\\Users\\").same_location("c:/users"));
        assert!(r("C:\\").same_location("c:"));
        assert!(!r("C:\\Users").same_location("D:\\Users"));
        assert!(r("C:\\Users").same_location("c:/users/"));
    }

    #[test]
    fn posix_comparison_normalises_separators() {
        assert!(r("/home/me/").same_location("/home//me"));
        assert!(!r("/home/me").same_location("/home/you"));
        assert!(r("/").same_location("//"));
        assert_eq!(comparison_key("/home//me/"), "/home/me");
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn posix_comparison_is_case_sensitive_on_linux() {
        assert!(!r("/Home").same_location("/home"));
    }

    #[test]
    fn breadcrumbs_for_drive_path() {
        let crumbs = breadcrumbs(&r("c:\\Users\\me"));
        let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C:", "Users", "me"]);
        assert_eq!(crumbs[0].path.as_str(), "c:\\");
        assert_eq!(crumbs[1].path.as_str(), "c:\\Users");
    }

    #[test]
    fn breadcrumbs_for_posix_path() {
        let crumbs = breadcrumbs(&r("/home/me"));
        let paths: Vec<&str> = crumbs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/home", "/home/me"]);
        assert_eq!(crumbs[0].name, "/");
    }

    #[test]
    fn breadcrumbs_for_root_is_single_segment() {
        let crumbs = breadcrumbs(&r("/"));
        assert_eq!(crumbs.len(), 1);
    }
}
