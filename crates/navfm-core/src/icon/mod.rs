//! Icon resolution for directory entries.
//!
//! [`IconResolver::resolve_icon`] turns a path into a small image. Most
//! files get the OS file-type icon; shell shortcuts (`.lnk`) and internet
//! shortcuts (`.url`) walk a chain of more specific sources first and fall
//! back to the OS icon of the shortcut file itself.
//!
//! Resolved icons are kept in an [`IconCache`] keyed by path. The cache is
//! independent of navigation state, so an icon fetched for a directory the
//! user has since left is still stored and reused.

pub mod decode;
pub mod favicon;
pub mod internet_shortcut;
pub mod lnk;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::settings::{normalize_extensions, IconConfig};
use crate::error::{CoreError, CoreResult};
use crate::fs::entry::DirectoryEntry;
use crate::fs::path::{comparison_key, resolve, CanonicalPath};
use crate::host::{Host, IconImage, IconSize};

/// Replaces `%NAME%` tokens using `lookup`.
///
/// Tokens whose name is unknown are left as written, and a lone `%` is
/// copied through.
pub fn expand_env(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            // "%%": the second percent may open a token of its own.
            Some(0) => {
                out.push('%');
                rest = after;
            }
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Lowercased extension of the last component of `path`, whichever
/// separator style it uses.
fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Produces icons for paths through a [`Host`].
pub struct IconResolver<H: Host + ?Sized> {
    host: Arc<H>,
    favicon_timeout: Duration,
    favicon_candidates: Vec<String>,
    native_extensions: BTreeSet<String>,
}

impl<H: Host + ?Sized> IconResolver<H> {
    pub fn new(host: Arc<H>, config: &IconConfig) -> Self {
        Self {
            host,
            favicon_timeout: config.favicon_timeout(),
            favicon_candidates: config.favicon_candidates.clone(),
            native_extensions: normalize_extensions(&config.native_icon_extensions),
        }
    }

    /// Returns `true` if `entry` should get its own icon instead of the
    /// generic one for its type.
    pub fn wants_native_icon(&self, entry: &DirectoryEntry) -> bool {
        !entry.is_dir()
            && entry
                .extension()
                .is_some_and(|ext| self.native_extensions.contains(&ext))
    }

    /// Resolves the icon for `path`.
    ///
    /// # Errors
    ///
    /// [`CoreError::IconUnavailable`] when every source came up empty.
    pub async fn resolve_icon(&self, path: &Path) -> CoreResult<IconImage> {
        let raw = path.to_string_lossy();
        let found = match extension_of(&raw).as_deref() {
            Some("lnk") => self.shortcut_icon(path).await,
            Some("url") => self.internet_shortcut_icon(path).await,
            _ => None,
        };
        let found = match found {
            Some(icon) => Some(icon),
            None => self.os_icon(path).await,
        };
        found.ok_or_else(|| CoreError::IconUnavailable(path.to_path_buf()))
    }

    /// The OS icon at the largest size that yields a non-empty image.
    async fn os_icon(&self, path: &Path) -> Option<IconImage> {
        for size in IconSize::DESCENDING {
            if let Some(icon) = self.host.file_icon(path, size).await {
                if !icon.is_empty() {
                    return Some(icon);
                }
            }
        }
        None
    }

    /// Finds a path recorded inside a shortcut. Quotes are dropped and
    /// `%NAME%` tokens expanded; relative paths are taken against `base`.
    fn locate(&self, recorded: &str, base: Option<&CanonicalPath>) -> Option<CanonicalPath> {
        let cleaned = expand_env(&recorded.trim().replace('"', ""), |name| {
            self.host.env_var(name)
        });
        if cleaned.is_empty() {
            return None;
        }
        if let Ok(absolute) = resolve(&cleaned) {
            return Some(absolute);
        }
        resolve(base?.join(&cleaned).as_str()).ok()
    }

    /// Icon from an explicit icon file: image files are decoded directly,
    /// executables and libraries go through the OS lookup.
    async fn icon_file(&self, icon: &CanonicalPath) -> Option<IconImage> {
        let name = Path::new(icon.file_name().unwrap_or(icon.as_str()));
        if decode::is_direct_image(name) {
            match self.host.read_file_bytes(icon.as_path()).await {
                Ok(bytes) => {
                    if let Some(image) = decode::direct_image(&bytes) {
                        return Some(image);
                    }
                    tracing::trace!("icon file {icon} did not decode");
                }
                Err(e) => tracing::trace!("icon file {icon} unreadable: {e}"),
            }
            if extension_of(icon.as_str()).as_deref() == Some("ico") {
                return self.os_icon(icon.as_path()).await;
            }
            return None;
        }
        if decode::is_icon_resource(name) {
            return self.os_icon(icon.as_path()).await;
        }
        None
    }

    async fn shortcut_icon(&self, path: &Path) -> Option<IconImage> {
        let info = match self.host.read_shortcut(path).await {
            Ok(info) => info,
            Err(e) => {
                tracing::trace!("shortcut {} unreadable: {e}", path.display());
                return None;
            }
        };
        let own_dir = resolve(&path.to_string_lossy())
            .ok()
            .and_then(|p| p.parent());

        if let Some(recorded) = info.icon_location.as_deref() {
            if let Some(icon) = self.locate(recorded, own_dir.as_ref()) {
                if self.host.exists(icon.as_path()).await {
                    if let Some(image) = self.icon_file(&icon).await {
                        return Some(image);
                    }
                }
                tracing::trace!("explicit shortcut icon {icon} gave nothing");
            }
        }

        if let Some(recorded) = info.target.as_deref() {
            let working_dir = info
                .working_directory
                .as_deref()
                .and_then(|dir| resolve(&expand_env(dir, |n| self.host.env_var(n))).ok());
            let base = working_dir.as_ref().or(own_dir.as_ref());
            if let Some(target) = self.locate(recorded, base) {
                if self.host.exists(target.as_path()).await {
                    if let Some(image) = self.os_icon(target.as_path()).await {
                        return Some(image);
                    }
                }
                tracing::trace!("shortcut target {target} gave no icon");
            }
        }
        None
    }

    async fn internet_shortcut_icon(&self, path: &Path) -> Option<IconImage> {
        let bytes = match self.host.read_file_bytes(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::trace!("internet shortcut {} unreadable: {e}", path.display());
                return None;
            }
        };
        let shortcut = internet_shortcut::parse(&bytes);
        let own_dir = resolve(&path.to_string_lossy())
            .ok()
            .and_then(|p| p.parent());

        if let Some(recorded) = shortcut.icon_file.as_deref() {
            if let Some(icon) = self.locate(recorded, own_dir.as_ref()) {
                if self.host.exists(icon.as_path()).await {
                    if let Some(image) = self.icon_file(&icon).await {
                        return Some(image);
                    }
                }
                tracing::trace!("IconFile {icon} gave nothing");
            }
        }

        if let Some(url) = shortcut.url.as_deref() {
            let favicon = favicon::probe(
                &*self.host,
                url,
                &self.favicon_candidates,
                self.favicon_timeout,
            )
            .await;
            if favicon.is_some() {
                return favicon;
            }
            tracing::trace!("no favicon found for {url}");
        }
        None
    }

    /// Returns the cached icon for `path`, resolving and storing it on a
    /// miss.
    ///
    /// While another caller is already resolving the same path this does no
    /// work and returns whatever is stored by then. Failures are not stored,
    /// so a later call tries again.
    pub async fn cached_icon(&self, cache: &IconCache, path: &Path) -> Option<IconImage> {
        let key = path.to_string_lossy();
        if let Some(icon) = cache.get(&key) {
            return Some(icon);
        }
        let Some(fetch) = cache.begin(&key) else {
            // Stored by another caller since the lookup above, or still in flight.
            return cache.get(&key);
        };
        let icon = match self.resolve_icon(path).await {
            Ok(icon) => Some(icon),
            Err(e) => {
                tracing::trace!("{e}");
                None
            }
        };
        fetch.finish(icon.clone());
        icon
    }

    /// Drops the cached icon for `path` and resolves it again.
    pub async fn refresh_icon(&self, cache: &IconCache, path: &Path) -> Option<IconImage> {
        cache.invalidate(&path.to_string_lossy());
        self.cached_icon(cache, path).await
    }
}

#[derive(Debug, Default)]
struct CacheState {
    icons: HashMap<String, IconImage>,
    in_flight: HashSet<String>,
}

/// Path-keyed icon store with "fetch once" bookkeeping.
///
/// Keys go through [`comparison_key`], so `C:\A.lnk` and `c:/a.lnk` share
/// an entry.
#[derive(Debug, Default)]
pub struct IconCache {
    state: Mutex<CacheState>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &str) -> Option<IconImage> {
        self.state().icons.get(&comparison_key(path)).cloned()
    }

    /// Marks `path` as being resolved. Returns `None` if it is already
    /// cached or in flight, in which case the caller should not fetch.
    pub fn begin(&self, path: &str) -> Option<PendingIcon<'_>> {
        let key = comparison_key(path);
        let mut state = self.state();
        if state.icons.contains_key(&key) || !state.in_flight.insert(key.clone()) {
            return None;
        }
        Some(PendingIcon { cache: self, key })
    }

    /// Forgets the icon for `path`. Returns `true` if one was stored.
    pub fn invalidate(&self, path: &str) -> bool {
        self.state().icons.remove(&comparison_key(path)).is_some()
    }

    pub fn len(&self) -> usize {
        self.state().icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fetch registered with [`IconCache::begin`].
///
/// The path stays marked as in flight until this is finished or dropped,
/// so a cancelled fetch does not block later ones.
#[must_use]
#[derive(Debug)]
pub struct PendingIcon<'a> {
    cache: &'a IconCache,
    key: String,
}

impl PendingIcon<'_> {
    /// Stores `icon`, if any. The last icon written for a path wins.
    pub fn finish(self, icon: Option<IconImage>) {
        if let Some(icon) = icon {
            self.cache.state().icons.insert(self.key.clone(), icon);
        }
    }
}

impl Drop for PendingIcon<'_> {
    fn drop(&mut self) {
        self.cache.state().in_flight.remove(&self.key);
    }
}
