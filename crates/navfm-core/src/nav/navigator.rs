//! Async driver for [`NavigationState`].
//!
//! [`Navigator`] owns the navigation state behind a short-lived lock and
//! performs directory loads through a [`Host`]. The lock is only held while
//! a ticket is issued or completed, never across the listing itself, so any
//! number of loads may be outstanding; [`NavigationState::complete`] drops
//! all but the latest.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::error::{CoreError, CoreResult};
use crate::event::{Command, Event};
use crate::fs::entry::DirectoryEntry;
use crate::fs::lister::list_directory;
use crate::fs::ops;
use crate::fs::path::{resolve, CanonicalPath};
use crate::host::Host;
use crate::nav::filter::{self, ViewPreferences};
use crate::nav::state::{LoadOutcome, LoadTicket, NavigationState};

#[derive(Debug)]
struct Inner {
    nav: NavigationState,
    prefs: ViewPreferences,
    search: String,
}

/// Navigation front door used by UIs.
pub struct Navigator<H: Host + ?Sized> {
    host: Arc<H>,
    inner: Mutex<Inner>,
    events: Option<UnboundedSender<Event>>,
}

impl<H: Host + ?Sized> Navigator<H> {
    pub fn new(host: Arc<H>, prefs: ViewPreferences) -> Self {
        Self {
            host,
            inner: Mutex::new(Inner {
                nav: NavigationState::new(),
                prefs,
                search: String::new(),
            }),
            events: None,
        }
    }

    /// Sends [`Event`]s to `tx` as loads complete and views change.
    pub fn with_events(mut self, tx: UnboundedSender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    async fn run(&self, ticket: LoadTicket) -> LoadOutcome {
        let id = ticket.id();
        let target = ticket.target().clone();
        tracing::debug!(id, path = %target, "load issued");

        let result = list_directory(self.host.as_ref(), &target).await;

        let (outcome, latest, loaded) = {
            let mut inner = self.lock();
            let outcome = inner.nav.complete(ticket, result);
            let loaded = match outcome {
                LoadOutcome::Applied => Some(inner.nav.entries().to_vec()),
                _ => None,
            };
            (outcome, inner.nav.request_sequence(), loaded)
        };

        match &outcome {
            LoadOutcome::Applied => {
                tracing::debug!(id, path = %target, "load applied");
                self.emit(Event::DirectoryLoaded {
                    path: target,
                    entries: loaded.unwrap_or_default(),
                });
            }
            LoadOutcome::Failed(failure) => {
                tracing::warn!(id, path = %target, "listing failed: {}", failure.message);
                self.emit(Event::LoadFailed(failure.clone()));
            }
            LoadOutcome::Superseded => {
                tracing::debug!(id, latest, path = %target, "stale result discarded");
            }
            LoadOutcome::Noop => {}
        }
        outcome
    }

    async fn run_opt(&self, ticket: Option<LoadTicket>) -> LoadOutcome {
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => LoadOutcome::Noop,
        }
    }

    /// Resolves `raw` and loads it.
    ///
    /// # Errors
    ///
    /// [`CoreError::Resolution`] if `raw` is not an absolute path; nothing
    /// changes in that case. Listing failures are not errors here: they are
    /// reported as [`LoadOutcome::Failed`] and kept in the state.
    pub async fn navigate(&self, raw: &str, push_history: bool) -> CoreResult<LoadOutcome> {
        let target = resolve(raw)?;
        Ok(self.navigate_to(target, push_history).await)
    }

    /// Loads an already-resolved path.
    pub async fn navigate_to(&self, target: CanonicalPath, push_history: bool) -> LoadOutcome {
        let ticket = self.lock().nav.begin_navigate(target, push_history);
        self.run(ticket).await
    }

    pub async fn go_back(&self) -> LoadOutcome {
        let ticket = self.lock().nav.begin_back();
        self.run_opt(ticket).await
    }

    pub async fn go_forward(&self) -> LoadOutcome {
        let ticket = self.lock().nav.begin_forward();
        self.run_opt(ticket).await
    }

    /// Loads the parent directory. A no-op at a root.
    pub async fn go_up(&self) -> LoadOutcome {
        let ticket = self.lock().nav.begin_up();
        self.run_opt(ticket).await
    }

    /// Reloads the current directory without touching history.
    pub async fn refresh(&self) -> LoadOutcome {
        let ticket = self.lock().nav.begin_refresh();
        self.run_opt(ticket).await
    }

    /// Loads the user's home folder.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the host knows no home folder, or
    /// [`CoreError::Resolution`] if it is not absolute.
    pub async fn open_home(&self) -> CoreResult<LoadOutcome> {
        let home = self
            .host
            .known_folders()
            .home
            .ok_or_else(|| CoreError::NotFound(PathBuf::from("~")))?;
        self.navigate(&home.to_string_lossy(), true).await
    }

    pub fn select_file(&self, path: PathBuf) {
        self.lock().nav.select_file(path);
    }

    pub fn select_folder(&self, path: PathBuf) {
        self.lock().nav.select_folder(path);
    }

    /// A copy of the full navigation state.
    pub fn snapshot(&self) -> NavigationState {
        self.lock().nav.clone()
    }

    pub fn current_path(&self) -> Option<CanonicalPath> {
        self.lock().nav.current_path().cloned()
    }

    pub fn preferences(&self) -> ViewPreferences {
        self.lock().prefs.clone()
    }

    pub fn search(&self) -> String {
        self.lock().search.clone()
    }

    /// Applies `f` to the view preferences.
    pub fn update_preferences(&self, f: impl FnOnce(&mut ViewPreferences)) {
        f(&mut self.lock().prefs);
        self.emit(Event::ViewChanged);
    }

    pub fn set_search(&self, term: &str) {
        self.lock().search = term.to_string();
        self.emit(Event::ViewChanged);
    }

    /// The current listing projected through the view preferences and the
    /// search term.
    pub fn visible_entries(&self) -> Vec<DirectoryEntry> {
        let inner = self.lock();
        filter::project(inner.nav.entries(), &inner.prefs, &inner.search)
    }

    /// Renames `path` using what the user typed, then reloads the listing.
    ///
    /// When `path` is in the current listing the typed name is completed
    /// with [`filter::completed_rename`], so a hidden extension is kept.
    /// Returns `None` when the input is blank or unchanged.
    ///
    /// # Errors
    ///
    /// See [`ops::rename_entry`].
    pub async fn rename(&self, path: &Path, typed: &str) -> CoreResult<Option<PathBuf>> {
        let new_name = {
            let inner = self.lock();
            let entry = inner
                .nav
                .entries()
                .iter()
                .find(|e| e.path().same_location(&path.to_string_lossy()));
            match entry {
                Some(entry) => filter::completed_rename(entry, typed, &inner.prefs),
                None => Some(typed.trim().to_string()).filter(|n| !n.is_empty()),
            }
        };
        let Some(new_name) = new_name else {
            return Ok(None);
        };

        let new_path = ops::rename_entry(self.host.as_ref(), path, &new_name).await?;
        self.emit(Event::Renamed {
            from: path.to_path_buf(),
            to: new_path.clone(),
        });
        self.refresh().await;
        Ok(Some(new_path))
    }

    /// Opens `path` with the platform's default application.
    pub async fn open(&self, path: &Path) -> CoreResult<()> {
        ops::open_entry(self.host.as_ref(), path).await
    }

    /// Executes a UI [`Command`].
    ///
    /// Commands that do not load a directory return [`LoadOutcome::Noop`].
    /// Failed file operations are also reported as
    /// [`Event::OperationFailed`].
    pub async fn execute(&self, command: Command) -> CoreResult<LoadOutcome> {
        match command {
            Command::Navigate(raw) => self.navigate(&raw, true).await,
            Command::GoUp => Ok(self.go_up().await),
            Command::GoBack => Ok(self.go_back().await),
            Command::GoForward => Ok(self.go_forward().await),
            Command::Refresh => Ok(self.refresh().await),
            Command::OpenHome => self.open_home().await,
            Command::ToggleHidden => {
                self.update_preferences(|p| p.show_hidden = !p.show_hidden);
                Ok(LoadOutcome::Noop)
            }
            Command::ToggleGroupDirectories => {
                self.update_preferences(|p| p.group_directories_first = !p.group_directories_first);
                Ok(LoadOutcome::Noop)
            }
            Command::ToggleHideExtensions => {
                self.update_preferences(|p| p.hide_extensions = !p.hide_extensions);
                Ok(LoadOutcome::Noop)
            }
            Command::SetSort(field, direction) => {
                self.update_preferences(|p| {
                    p.sort_field = field;
                    p.sort_direction = direction;
                });
                Ok(LoadOutcome::Noop)
            }
            Command::Search(term) => {
                self.set_search(&term);
                Ok(LoadOutcome::Noop)
            }
            Command::SelectFile(path) => {
                self.select_file(path);
                Ok(LoadOutcome::Noop)
            }
            Command::SelectFolder(path) => {
                self.select_folder(path);
                Ok(LoadOutcome::Noop)
            }
            Command::Rename(path, typed) => {
                if let Err(e) = self.rename(&path, &typed).await {
                    self.emit(Event::OperationFailed {
                        operation: format!("rename {}", path.display()),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                Ok(LoadOutcome::Noop)
            }
            Command::Open(path) => {
                if let Err(e) = self.open(&path).await {
                    self.emit(Event::OperationFailed {
                        operation: format!("open {}", path.display()),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                Ok(LoadOutcome::Noop)
            }
        }
    }
}
