//! The boundary between the navigation core and the operating system.
//!
//! Every filesystem, icon, and network call the core makes goes through the
//! [`Host`] trait so that navigation, listing, and icon resolution can be
//! exercised against [`memory::MemoryHost`] with no real filesystem.
//! [`native::NativeHost`] is the implementation backed by `std`/`tokio`
//! and `reqwest`.

pub mod memory;
pub mod native;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use base64::Engine;

use crate::error::CoreResult;

pub use memory::{MemoryFailure, MemoryHost};
pub use native::NativeHost;

/// One child returned by a single-level directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    pub name: String,
    pub is_dir: bool,
}

impl DirChild {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Result of a `stat` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Requested icon size, tried from largest to smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSize {
    Large,
    Normal,
    Small,
}

impl IconSize {
    /// Preference order used by the default icon lookup.
    pub const DESCENDING: [IconSize; 3] = [IconSize::Large, IconSize::Normal, IconSize::Small];

    /// Edge length in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Large => 48,
            IconSize::Normal => 32,
            IconSize::Small => 16,
        }
    }
}

/// Encoded image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl IconImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/png")
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Renders the image as a `data:` URL for embedding in a UI.
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime, encoded)
    }
}

/// Fields recorded in a shell shortcut (`.lnk`) file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutInfo {
    pub target: Option<String>,
    pub icon_location: Option<String>,
    pub working_directory: Option<String>,
}

/// A fetched network resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Total and free space of a storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Whether the host organises storage under drive letters or a single root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStyle {
    DriveLetters,
    SingleRoot,
}

/// Well-known user folders shown in the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFolders {
    pub home: Option<PathBuf>,
    pub desktop: Option<PathBuf>,
    pub documents: Option<PathBuf>,
    pub downloads: Option<PathBuf>,
}

/// Operating-system services consumed by the core.
///
/// Implementations must be cheap to share (`Send + Sync`) because the
/// navigator, icon resolver, and root poller all hold the same host.
#[async_trait]
pub trait Host: Send + Sync {
    /// Single-level enumeration of `path`.
    async fn read_dir(&self, path: &Path) -> CoreResult<Vec<DirChild>>;

    /// Metadata for one path.
    async fn stat(&self, path: &Path) -> CoreResult<FileStat>;

    /// Returns `true` if something exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// Best-effort capacity of every mounted root, keyed by drive letter
    /// (`"C"`) or root path (`"/"`).
    async fn root_capacities(&self) -> CoreResult<HashMap<String, Capacity>>;

    /// The OS file-type icon for `path` at `size`, or `None` when empty.
    async fn file_icon(&self, path: &Path, size: IconSize) -> Option<IconImage>;

    /// Reads a shell shortcut file.
    async fn read_shortcut(&self, path: &Path) -> CoreResult<ShortcutInfo>;

    /// Reads a whole file.
    async fn read_file_bytes(&self, path: &Path) -> CoreResult<Vec<u8>>;

    /// GETs `url`, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> CoreResult<FetchResponse>;

    /// Opens `path` with the platform's default handler.
    async fn open_path(&self, path: &Path) -> CoreResult<()>;

    /// Raw rename. Callers validate names through [`crate::fs::ops::rename_entry`].
    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()>;

    /// Looks up an environment variable for `%NAME%` expansion.
    fn env_var(&self, name: &str) -> Option<String>;

    fn known_folders(&self) -> KnownFolders;

    fn root_style(&self) -> RootStyle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_sizes_descend() {
        let px: Vec<u32> = IconSize::DESCENDING.iter().map(|s| s.pixels()).collect();
        assert_eq!(px, vec![48, 32, 16]);
    }

    #[test]
    fn data_url_encodes_base64() {
        let image = IconImage::new(vec![1, 2, 3], "image/x-icon");
        assert_eq!(image.data_url(), "data:image/x-icon;base64,AQID");
    }

    #[test]
    fn fetch_success_range() {
        let mut resp = FetchResponse {
            status: 204,
            content_type: None,
            body: Vec::new(),
        };
        assert!(resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }
}
