//! Event system for communication between UI and Core.
//!
//! The UI translates user input into [`Command`]s, which the
//! [`crate::nav::navigator::Navigator`] executes and answers with
//! [`Event`]s. This decoupling allows any frontend to drive the same core
//! logic.

use std::path::PathBuf;

use crate::error::ListingFailure;
use crate::fs::entry::DirectoryEntry;
use crate::fs::path::CanonicalPath;
use crate::fs::roots::DriveRoot;
use crate::nav::filter::{SortDirection, SortField};

/// An action the UI requests the core to perform.
///
/// Commands flow **UI → Core**. The core never creates commands itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Navigate to a user-typed or clicked path, recording history.
    Navigate(String),
    /// Move to the parent directory.
    GoUp,
    /// Navigate backward in history.
    GoBack,
    /// Navigate forward in history.
    GoForward,
    /// Re-read the current directory without touching history.
    Refresh,
    /// Load the home folder.
    OpenHome,
    /// Toggle visibility of hidden (dot-prefixed) entries.
    ToggleHidden,
    /// Toggle directories-before-files grouping.
    ToggleGroupDirectories,
    /// Toggle hiding of known extensions in display names.
    ToggleHideExtensions,
    /// Change the sort field and direction.
    SetSort(SortField, SortDirection),
    /// Replace the search term (empty clears it).
    Search(String),
    /// Select a file (clears any folder selection).
    SelectFile(PathBuf),
    /// Select a folder (clears any file selection).
    SelectFolder(PathBuf),
    /// Rename an entry of the current directory; the string is what the
    /// user typed.
    Rename(PathBuf, String),
    /// Open an entry with the platform's default application.
    Open(PathBuf),
}

/// A notification the core sends back to the UI.
///
/// Events flow **Core → UI**. The UI uses these to update its display state.
#[derive(Debug, Clone)]
pub enum Event {
    /// A load was applied: `path` is now current and `entries` is its listing.
    DirectoryLoaded {
        path: CanonicalPath,
        entries: Vec<DirectoryEntry>,
    },
    /// The latest load failed; the current path did not move.
    LoadFailed(ListingFailure),
    /// Fresh storage roots from the root poller.
    RootsChanged(Vec<DriveRoot>),
    /// View preferences or the search term changed.
    ViewChanged,
    /// An entry was renamed.
    Renamed { from: PathBuf, to: PathBuf },
    /// A file operation failed.
    OperationFailed {
        /// Human-readable description of the operation.
        operation: String,
        /// The error message.
        error: String,
    },
}
