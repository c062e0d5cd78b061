//! [`Host`] implementation backed by the real operating system.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::{
    Capacity, DirChild, FetchResponse, FileStat, Host, IconImage, IconSize, KnownFolders,
    RootStyle, ShortcutInfo,
};
use crate::error::{CoreError, CoreResult};
use crate::fs::roots::{parse_df_output, parse_wmic_csv};
use crate::icon::{decode, lnk};

/// Host backed by `std::fs` (on blocking threads), `tokio::process`, and
/// `reqwest`.
#[derive(Debug, Clone)]
pub struct NativeHost {
    client: reqwest::Client,
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeHost {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn read_dir_blocking(path: &Path) -> CoreResult<Vec<DirChild>> {
    let meta = std::fs::metadata(path).map_err(|e| CoreError::from_io(path, e))?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(path.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(path).map_err(|e| CoreError::from_io(path, e))?;
    let mut children = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                tracing::trace!("skipping unreadable entry in {}: {e}", path.display());
                continue;
            }
        };
        // A lossy name would not lead back to the file, so such entries are left out.
        let name = match dir_entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::trace!("skipping non-UTF-8 name {raw:?} in {}", path.display());
                continue;
            }
        };
        let is_dir = match dir_entry.file_type() {
            // Symlinks are listed by what they point at so linked folders stay navigable.
            Ok(ft) if ft.is_symlink() => std::fs::metadata(dir_entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false),
            Ok(ft) => ft.is_dir(),
            Err(_) => false,
        };
        children.push(DirChild { name, is_dir });
    }
    Ok(children)
}

/// The platform opener with `path` as its only argument. No shell is
/// involved, so names containing `&` or `^` reach the opener verbatim.
fn open_command(path: &Path) -> tokio::process::Command {
    let program = if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    let mut command = tokio::process::Command::new(program);
    command.arg(path);
    command
}

async fn blocking<T, F>(path: &Path, f: F) -> CoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
}

#[async_trait]
impl Host for NativeHost {
    async fn read_dir(&self, path: &Path) -> CoreResult<Vec<DirChild>> {
        let owned = path.to_path_buf();
        blocking(path, move || read_dir_blocking(&owned)).await
    }

    async fn stat(&self, path: &Path) -> CoreResult<FileStat> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))?;
        Ok(FileStat {
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn root_capacities(&self) -> CoreResult<HashMap<String, Capacity>> {
        let program = if cfg!(windows) { "wmic" } else { "df" };
        let mut command = tokio::process::Command::new(program);
        if cfg!(windows) {
            command.args(["logicaldisk", "get", "Caption,FreeSpace,Size", "/format:csv"]);
        } else {
            command.args(["-Pk", "/"]);
        }
        let output = command
            .output()
            .await
            .map_err(|e| CoreError::Unreadable {
                path: PathBuf::from(program),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(CoreError::Unreadable {
                path: PathBuf::from(program),
                reason: format!("exited with {}", output.status),
            });
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(if cfg!(windows) {
            parse_wmic_csv(&text)
        } else {
            parse_df_output(&text)
        })
    }

    async fn file_icon(&self, path: &Path, size: IconSize) -> Option<IconImage> {
        // Without a desktop icon theme the only icon we can produce is a
        // thumbnail of an image file itself.
        if !decode::is_decodable_image(path) {
            return None;
        }
        let bytes = tokio::fs::read(path).await.ok()?;
        let px = size.pixels();
        tokio::task::spawn_blocking(move || decode::thumbnail_png(&bytes, px))
            .await
            .ok()
            .flatten()
            .map(IconImage::png)
    }

    async fn read_shortcut(&self, path: &Path) -> CoreResult<ShortcutInfo> {
        let bytes = self.read_file_bytes(path).await?;
        lnk::parse(&bytes).map_err(|reason| CoreError::Unreadable {
            path: path.to_path_buf(),
            reason,
        })
    }

    async fn read_file_bytes(&self, path: &Path) -> CoreResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> CoreResult<FetchResponse> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?
            .to_vec();
        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }

    async fn open_path(&self, path: &Path) -> CoreResult<()> {
        if !self.exists(path).await {
            return Err(CoreError::NotFound(path.to_path_buf()));
        }
        open_command(path)
            .spawn()
            .map_err(|e| CoreError::from_io(path, e))?;
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| CoreError::from_io(from, e))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn known_folders(&self) -> KnownFolders {
        let Some(home) = home_dir() else {
            return KnownFolders::default();
        };
        KnownFolders {
            desktop: Some(home.join("Desktop")),
            documents: Some(home.join("Documents")),
            downloads: Some(home.join("Downloads")),
            home: Some(home),
        }
    }

    fn root_style(&self) -> RootStyle {
        if cfg!(windows) {
            RootStyle::DriveLetters
        } else {
            RootStyle::SingleRoot
        }
    }
}
