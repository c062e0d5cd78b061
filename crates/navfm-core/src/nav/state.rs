//! The navigation state machine.
//!
//! [`NavigationState`] is plain data plus synchronous transitions. Every
//! load goes through two steps:
//!
//! 1. a `begin_*` call bumps the request sequence and returns a
//!    [`LoadTicket`] carrying the sequence id, the target, and the history
//!    that should take effect if the load succeeds;
//! 2. [`NavigationState::complete`] applies the listing (or the failure)
//!    only if the ticket's id is still the latest one issued.
//!
//! Each `begin_*` builds on the latest issued load, not only on what has
//! been committed: two back-presses made before the first listing arrives
//! step back twice. The history a ticket carries is committed only when
//! that ticket is applied, so a superseded or failed load never leaves a
//! trace in the back/forward stacks.

use std::path::PathBuf;

use crate::error::{CoreResult, ListingFailure};
use crate::fs::entry::DirectoryEntry;
use crate::fs::path::CanonicalPath;
use crate::nav::history::History;

/// A load that has been issued but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    target: CanonicalPath,
    history: History,
}

impl LoadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> &CanonicalPath {
        &self.target
    }
}

/// What happened to a completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The listing replaced the previous one and the target is now current.
    Applied,
    /// The load was the latest one but the directory could not be listed.
    Failed(ListingFailure),
    /// A newer load was issued meanwhile; the result was discarded.
    Superseded,
    /// Nothing was loaded (empty history, already at a root, ...).
    Noop,
}

/// Session navigation state: current directory, history, and the latest
/// listing.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    current_path: Option<CanonicalPath>,
    history: History,
    request_sequence: u64,
    entries: Vec<DirectoryEntry>,
    selected_file: Option<PathBuf>,
    selected_folder: Option<PathBuf>,
    error: Option<ListingFailure>,
    loading: bool,
    /// Target and history of the latest issued load, until it completes.
    pending: Option<(CanonicalPath, History)>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first successful load.
    pub fn current_path(&self) -> Option<&CanonicalPath> {
        self.current_path.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Id of the most recently issued load.
    pub fn request_sequence(&self) -> u64 {
        self.request_sequence
    }

    /// The listing of the current directory, in base order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn selected_file(&self) -> Option<&PathBuf> {
        self.selected_file.as_ref()
    }

    pub fn selected_folder(&self) -> Option<&PathBuf> {
        self.selected_folder.as_ref()
    }

    /// The failure of the latest load, if it failed.
    pub fn error(&self) -> Option<&ListingFailure> {
        self.error.as_ref()
    }

    /// `true` while the latest issued load has not completed.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The location and history the next transition starts from.
    fn base(&self) -> (Option<&CanonicalPath>, &History) {
        match &self.pending {
            Some((target, history)) => (Some(target), history),
            None => (self.current_path.as_ref(), &self.history),
        }
    }

    fn issue(&mut self, target: CanonicalPath, history: History) -> LoadTicket {
        self.request_sequence += 1;
        self.loading = true;
        self.pending = Some((target.clone(), history.clone()));
        LoadTicket {
            id: self.request_sequence,
            target,
            history,
        }
    }

    /// Starts a load of `target`.
    ///
    /// With `push_history`, the current path (the target of a load still in
    /// flight, if any) is pushed onto the back stack, clearing the forward
    /// stack, unless it already names `target`. Without it, history is left
    /// as is.
    pub fn begin_navigate(&mut self, target: CanonicalPath, push_history: bool) -> LoadTicket {
        let history = match self.base() {
            (Some(current), history)
                if push_history && !current.same_location(target.as_str()) =>
            {
                history.push(current.clone())
            }
            (_, history) => history.clone(),
        };
        self.issue(target, history)
    }

    /// Starts a load of the previous directory. `None` when the back stack
    /// is empty.
    pub fn begin_back(&mut self) -> Option<LoadTicket> {
        let (current, history) = self.base();
        let (history, target) = history.go_back(current)?;
        Some(self.issue(target, history))
    }

    /// Starts a load of the next directory. `None` when the forward stack
    /// is empty.
    pub fn begin_forward(&mut self) -> Option<LoadTicket> {
        let (current, history) = self.base();
        let (history, target) = history.go_forward(current)?;
        Some(self.issue(target, history))
    }

    /// Starts a load of the parent directory, recording history. `None` at
    /// a root or before anything is loaded; the sequence is left untouched.
    pub fn begin_up(&mut self) -> Option<LoadTicket> {
        let parent = self.base().0?.parent()?;
        Some(self.begin_navigate(parent, true))
    }

    /// Starts a reload of the current directory. `None` before anything is
    /// loaded.
    pub fn begin_refresh(&mut self) -> Option<LoadTicket> {
        let current = self.base().0?.clone();
        Some(self.begin_navigate(current, false))
    }

    /// Returns `true` if `ticket` is the latest load issued.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.id == self.request_sequence
    }

    /// Applies the result of the load identified by `ticket`.
    ///
    /// A superseded ticket changes nothing. On success the target becomes
    /// current, the ticket's history is committed, the listing replaces the
    /// old one, and selection and error are cleared. On failure the current
    /// path and history stay put, the listing is emptied, and the failure is
    /// kept for display. Either way later transitions start from the
    /// committed state again.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: CoreResult<Vec<DirectoryEntry>>,
    ) -> LoadOutcome {
        if !self.is_current(&ticket) {
            return LoadOutcome::Superseded;
        }
        self.loading = false;
        self.pending = None;
        match result {
            Ok(entries) => {
                self.current_path = Some(ticket.target);
                self.history = ticket.history;
                self.entries = entries;
                self.selected_file = None;
                self.selected_folder = None;
                self.error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                let failure = ListingFailure::new(ticket.target.as_path().to_path_buf(), &e);
                self.entries.clear();
                self.error = Some(failure.clone());
                LoadOutcome::Failed(failure)
            }
        }
    }

    pub fn select_file(&mut self, path: PathBuf) {
        self.selected_file = Some(path);
        self.selected_folder = None;
    }

    pub fn select_folder(&mut self, path: PathBuf) {
        self.selected_folder = Some(path);
        self.selected_file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, FailureKind};
    use crate::fs::path::resolve;

    fn p(raw: &str) -> CanonicalPath {
        resolve(raw).unwrap()
    }

    fn load(state: &mut NavigationState, raw: &str, push: bool) {
        let ticket = state.begin_navigate(p(raw), push);
        assert_eq!(state.complete(ticket, Ok(Vec::new())), LoadOutcome::Applied);
    }

    fn stack(paths: &[CanonicalPath]) -> Vec<&str> {
        paths.iter().map(CanonicalPath::as_str).collect()
    }

    #[test]
    fn first_load_does_not_push_history() {
        let mut state = NavigationState::new();
        load(&mut state, "/p0", true);
        assert_eq!(state.current_path().unwrap().as_str(), "/p0");
        assert!(!state.history().can_go_back());
    }

    #[test]
    fn back_and_forward_follow_browser_semantics() {
        let mut state = NavigationState::new();
        load(&mut state, "/p0", false);
        load(&mut state, "/p1", true);
        load(&mut state, "/p2", true);
        assert_eq!(stack(state.history().back_stack()), vec!["/p0", "/p1"]);

        let ticket = state.begin_back().unwrap();
        state.complete(ticket, Ok(Vec::new()));
        assert_eq!(state.current_path().unwrap().as_str(), "/p1");
        assert_eq!(stack(state.history().back_stack()), vec!["/p0"]);
        assert_eq!(stack(state.history().forward_stack()), vec!["/p2"]);

        let ticket = state.begin_back().unwrap();
        state.complete(ticket, Ok(Vec::new()));
        assert_eq!(state.current_path().unwrap().as_str(), "/p0");
        assert!(state.history().back_stack().is_empty());
        assert_eq!(stack(state.history().forward_stack()), vec!["/p1", "/p2"]);

        load(&mut state, "/p3", true);
        assert!(state.history().forward_stack().is_empty());
        assert_eq!(stack(state.history().back_stack()), vec!["/p0"]);
    }

    #[test]
    fn navigating_to_same_path_does_not_push() {
        let mut state = NavigationState::new();
        load(&mut state, "C:\\Users", false);
        load(&mut state, "c:/users/", true);
        assert!(!state.history().can_go_back());
    }

    #[test]
    fn up_at_root_is_noop_without_sequence_bump() {
        let mut state = NavigationState::new();
        load(&mut state, "C:", false);
        let before = state.request_sequence();
        assert!(state.begin_up().is_none());
        assert_eq!(state.request_sequence(), before);
        assert_eq!(state.current_path().unwrap().as_str(), "C:\\");

        load(&mut state, "/", false);
        assert!(state.begin_up().is_none());
        assert!(!state.history().can_go_back());
    }

    #[test]
    fn up_pushes_history() {
        let mut state = NavigationState::new();
        load(&mut state, "/home/me", false);
        let ticket = state.begin_up().unwrap();
        assert_eq!(ticket.target().as_str(), "/home");
        state.complete(ticket, Ok(Vec::new()));
        assert_eq!(stack(state.history().back_stack()), vec!["/home/me"]);
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut state = NavigationState::new();
        assert!(state.begin_back().is_none());
        assert!(state.begin_forward().is_none());
        assert!(state.begin_up().is_none());
        assert!(state.begin_refresh().is_none());
        assert_eq!(state.request_sequence(), 0);
    }

    #[test]
    fn queued_back_presses_each_step_back() {
        let mut state = NavigationState::new();
        load(&mut state, "/p0", false);
        load(&mut state, "/p1", true);
        load(&mut state, "/p2", true);

        let first = state.begin_back().unwrap();
        let second = state.begin_back().unwrap();
        assert_eq!(first.target().as_str(), "/p1");
        assert_eq!(second.target().as_str(), "/p0");

        assert_eq!(state.complete(first, Ok(Vec::new())), LoadOutcome::Superseded);
        assert_eq!(state.current_path().unwrap().as_str(), "/p2");
        assert_eq!(state.complete(second, Ok(Vec::new())), LoadOutcome::Applied);
        assert_eq!(state.current_path().unwrap().as_str(), "/p0");
        assert!(state.history().back_stack().is_empty());
        assert_eq!(stack(state.history().forward_stack()), vec!["/p1", "/p2"]);
    }

    #[test]
    fn navigate_while_loading_pushes_pending_target() {
        let mut state = NavigationState::new();
        load(&mut state, "/p0", false);
        let first = state.begin_navigate(p("/p1"), true);
        let second = state.begin_navigate(p("/p2"), true);
        state.complete(first, Ok(Vec::new()));
        state.complete(second, Ok(Vec::new()));
        assert_eq!(stack(state.history().back_stack()), vec!["/p0", "/p1"]);
    }

    #[test]
    fn failed_latest_load_restarts_from_committed_history() {
        let mut state = NavigationState::new();
        load(&mut state, "/p0", false);
        load(&mut state, "/p1", true);
        load(&mut state, "/p2", true);

        let first = state.begin_back().unwrap();
        let second = state.begin_back().unwrap();
        let outcome = state.complete(second, Err(CoreError::NotFound(PathBuf::from("/p0"))));
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(state.complete(first, Ok(Vec::new())), LoadOutcome::Superseded);

        assert_eq!(state.current_path().unwrap().as_str(), "/p2");
        assert_eq!(stack(state.history().back_stack()), vec!["/p0", "/p1"]);
        assert!(state.history().forward_stack().is_empty());
        assert_eq!(state.begin_back().unwrap().target().as_str(), "/p1");
    }

    #[test]
    fn superseded_result_is_discarded() {
        let mut state = NavigationState::new();
        let slow = state.begin_navigate(p("/a"), true);
        let fast = state.begin_navigate(p("/b"), true);

        assert_eq!(state.complete(fast, Ok(Vec::new())), LoadOutcome::Applied);
        assert_eq!(state.complete(slow, Ok(Vec::new())), LoadOutcome::Superseded);
        assert_eq!(state.current_path().unwrap().as_str(), "/b");
        assert!(!state.is_loading());
    }

    #[test]
    fn failure_keeps_path_and_history() {
        let mut state = NavigationState::new();
        load(&mut state, "/ok", false);
        state.select_file(PathBuf::from("/ok/file"));

        let ticket = state.begin_navigate(p("/locked"), true);
        let outcome = state.complete(
            ticket,
            Err(CoreError::PermissionDenied(PathBuf::from("/locked"))),
        );
        match outcome {
            LoadOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::PermissionDenied),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.current_path().unwrap().as_str(), "/ok");
        assert!(!state.history().can_go_back());
        assert!(state.entries().is_empty());
        assert!(state.error().is_some());
    }

    #[test]
    fn success_clears_selection_and_error() {
        let mut state = NavigationState::new();
        let ticket = state.begin_navigate(p("/gone"), true);
        state.complete(ticket, Err(CoreError::NotFound(PathBuf::from("/gone"))));
        state.select_folder(PathBuf::from("/x"));

        load(&mut state, "/here", true);
        assert!(state.error().is_none());
        assert!(state.selected_folder().is_none());
        assert!(state.selected_file().is_none());
    }

    #[test]
    fn selection_is_exclusive() {
        let mut state = NavigationState::new();
        state.select_file(PathBuf::from("/a"));
        state.select_folder(PathBuf::from("/b"));
        assert!(state.selected_file().is_none());
        assert_eq!(state.selected_folder(), Some(&PathBuf::from("/b")));
    }
}
