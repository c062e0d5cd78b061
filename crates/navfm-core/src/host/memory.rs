//! In-memory [`Host`] used by tests and headless frontends.
//!
//! Paths are keyed by their exact string form, so callers should register
//! canonical paths (see [`crate::fs::path::resolve`]). Directory listings can
//! be held back with [`MemoryHost::gate_listing`] to control the order in
//! which concurrent loads complete.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{
    Capacity, DirChild, FetchResponse, FileStat, Host, IconImage, IconSize, KnownFolders,
    RootStyle, ShortcutInfo,
};
use crate::error::{CoreError, CoreResult};

/// How a scripted listing should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFailure {
    NotFound,
    PermissionDenied,
    Unreadable,
}

impl MemoryFailure {
    fn to_error(self, path: &Path) -> CoreError {
        match self {
            MemoryFailure::NotFound => CoreError::NotFound(path.to_path_buf()),
            MemoryFailure::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            MemoryFailure::Unreadable => CoreError::Unreadable {
                path: path.to_path_buf(),
                reason: "scripted failure".to_string(),
            },
        }
    }
}

#[derive(Debug)]
struct MemoryState {
    dirs: HashMap<String, Vec<DirChild>>,
    list_failures: HashMap<String, MemoryFailure>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    stat_failures: HashSet<String>,
    files: HashMap<String, Vec<u8>>,
    existing: HashSet<String>,
    icons: HashMap<(String, IconSize), IconImage>,
    shortcuts: HashMap<String, ShortcutInfo>,
    responses: HashMap<String, FetchResponse>,
    capacities: Option<HashMap<String, Capacity>>,
    env: HashMap<String, String>,
    known: KnownFolders,
    root_style: RootStyle,
    listing_calls: Vec<String>,
    fetched: Vec<String>,
    opened: Vec<String>,
}

/// A scriptable, fully in-memory host.
#[derive(Debug)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(RootStyle::SingleRoot)
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl MemoryHost {
    pub fn new(root_style: RootStyle) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                dirs: HashMap::new(),
                list_failures: HashMap::new(),
                gates: HashMap::new(),
                stat_failures: HashSet::new(),
                files: HashMap::new(),
                existing: HashSet::new(),
                icons: HashMap::new(),
                shortcuts: HashMap::new(),
                responses: HashMap::new(),
                capacities: Some(HashMap::new()),
                env: HashMap::new(),
                known: KnownFolders::default(),
                root_style,
                listing_calls: Vec::new(),
                fetched: Vec::new(),
                opened: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a directory and its children.
    pub fn insert_dir(&self, path: &str, children: Vec<DirChild>) {
        let mut state = self.state();
        state.existing.insert(path.to_string());
        state.dirs.insert(path.to_string(), children);
    }

    /// Registers a file with the given contents.
    pub fn insert_file(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        let mut state = self.state();
        state.existing.insert(path.to_string());
        state.files.insert(path.to_string(), bytes.into());
    }

    /// Makes `stat(path)` fail with permission denied.
    pub fn fail_stat(&self, path: &str) {
        self.state().stat_failures.insert(path.to_string());
    }

    /// Makes `read_dir(path)` fail.
    pub fn fail_listing(&self, path: &str, failure: MemoryFailure) {
        self.state().list_failures.insert(path.to_string(), failure);
    }

    /// Holds the next listing of `path` until the returned sender fires
    /// (or is dropped).
    pub fn gate_listing(&self, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state()
            .gates
            .entry(path.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn mark_exists(&self, path: &str) {
        self.state().existing.insert(path.to_string());
    }

    pub fn insert_icon(&self, path: &str, size: IconSize, image: IconImage) {
        self.state().icons.insert((path.to_string(), size), image);
    }

    pub fn insert_shortcut(&self, path: &str, info: ShortcutInfo) {
        let mut state = self.state();
        state.existing.insert(path.to_string());
        state.shortcuts.insert(path.to_string(), info);
    }

    pub fn insert_response(&self, url: &str, response: FetchResponse) {
        self.state().responses.insert(url.to_string(), response);
    }

    /// `None` makes `root_capacities` fail.
    pub fn set_capacities(&self, capacities: Option<HashMap<String, Capacity>>) {
        self.state().capacities = capacities;
    }

    pub fn set_env(&self, name: &str, value: &str) {
        self.state().env.insert(name.to_string(), value.to_string());
    }

    pub fn set_known_folders(&self, known: KnownFolders) {
        self.state().known = known;
    }

    /// Every path passed to `read_dir`, in call order.
    pub fn listing_calls(&self) -> Vec<String> {
        self.state().listing_calls.clone()
    }

    /// Every URL passed to `fetch`, in call order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.state().fetched.clone()
    }

    pub fn opened_paths(&self) -> Vec<String> {
        self.state().opened.clone()
    }

    pub fn file_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }
}

#[async_trait]
impl Host for MemoryHost {
    async fn read_dir(&self, path: &Path) -> CoreResult<Vec<DirChild>> {
        let k = key(path);
        let gate = {
            let mut state = self.state();
            state.listing_calls.push(k.clone());
            state.gates.get_mut(&k).and_then(VecDeque::pop_front)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let state = self.state();
        if let Some(failure) = state.list_failures.get(&k) {
            return Err(failure.to_error(path));
        }
        if let Some(children) = state.dirs.get(&k) {
            return Ok(children.clone());
        }
        if state.files.contains_key(&k) {
            return Err(CoreError::NotADirectory(path.to_path_buf()));
        }
        Err(CoreError::NotFound(path.to_path_buf()))
    }

    async fn stat(&self, path: &Path) -> CoreResult<FileStat> {
        let k = key(path);
        let state = self.state();
        if state.stat_failures.contains(&k) {
            return Err(CoreError::PermissionDenied(path.to_path_buf()));
        }
        if state.dirs.contains_key(&k) {
            return Ok(FileStat {
                is_file: false,
                is_dir: true,
                size: 0,
                modified: None,
            });
        }
        if let Some(bytes) = state.files.get(&k) {
            return Ok(FileStat {
                is_file: true,
                is_dir: false,
                size: bytes.len() as u64,
                modified: None,
            });
        }
        Err(CoreError::NotFound(path.to_path_buf()))
    }

    async fn exists(&self, path: &Path) -> bool {
        let k = key(path);
        let state = self.state();
        state.existing.contains(&k) || state.dirs.contains_key(&k)
    }

    async fn root_capacities(&self) -> CoreResult<HashMap<String, Capacity>> {
        self.state()
            .capacities
            .clone()
            .ok_or_else(|| CoreError::Unreadable {
                path: PathBuf::from("/"),
                reason: "capacity probe unavailable".to_string(),
            })
    }

    async fn file_icon(&self, path: &Path, size: IconSize) -> Option<IconImage> {
        self.state().icons.get(&(key(path), size)).cloned()
    }

    async fn read_shortcut(&self, path: &Path) -> CoreResult<ShortcutInfo> {
        self.state()
            .shortcuts
            .get(&key(path))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(path.to_path_buf()))
    }

    async fn read_file_bytes(&self, path: &Path) -> CoreResult<Vec<u8>> {
        self.state()
            .files
            .get(&key(path))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(path.to_path_buf()))
    }

    async fn fetch(&self, url: &str, _timeout: Duration) -> CoreResult<FetchResponse> {
        let mut state = self.state();
        state.fetched.push(url.to_string());
        state
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| CoreError::Network(format!("unreachable: {url}")))
    }

    async fn open_path(&self, path: &Path) -> CoreResult<()> {
        let k = key(path);
        let mut state = self.state();
        if !state.existing.contains(&k) && !state.dirs.contains_key(&k) {
            return Err(CoreError::NotFound(path.to_path_buf()));
        }
        state.opened.push(k);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        let (from_key, to_key) = (key(from), key(to));
        let mut state = self.state();
        if !state.existing.remove(&from_key) {
            return Err(CoreError::NotFound(from.to_path_buf()));
        }
        state.existing.insert(to_key.clone());
        if let Some(bytes) = state.files.remove(&from_key) {
            state.files.insert(to_key.clone(), bytes);
        }
        if let Some(children) = state.dirs.remove(&from_key) {
            state.dirs.insert(to_key, children);
        }
        Ok(())
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.state().env.get(name).cloned()
    }

    fn known_folders(&self) -> KnownFolders {
        self.state().known.clone()
    }

    fn root_style(&self) -> RootStyle {
        self.state().root_style
    }
}
