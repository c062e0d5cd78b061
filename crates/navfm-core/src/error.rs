//! Error types for `navfm-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Listing failures that must
//! be kept in navigation state are summarised as a cloneable
//! [`ListingFailure`].

use std::path::{Path, PathBuf};

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A listing or read failed for a reason not otherwise classified.
    #[error("unreadable: {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// A user-supplied path could not be resolved (empty, relative, ...).
    #[error("cannot resolve path: {0}")]
    Resolution(String),

    /// A file or directory name is invalid (empty, contains separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A rename destination is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// A network request failed or returned a non-success status.
    #[error("network error: {0}")]
    Network(String),

    /// Every icon lookup tier was exhausted.
    #[error("no icon available: {0}")]
    IconUnavailable(PathBuf),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classifies an I/O error raised while accessing `path`.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                CoreError::PermissionDenied(path.to_path_buf())
            }
            _ => CoreError::Unreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

/// Convenience alias used throughout `navfm-core`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a failed directory load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    NotADirectory,
    Unreadable,
}

/// A whole-listing failure, kept in navigation state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ListingFailure {
    /// Summarises `err` raised while listing `path`.
    pub fn new(path: PathBuf, err: &CoreError) -> Self {
        let kind = match err {
            CoreError::NotFound(_) => FailureKind::NotFound,
            CoreError::PermissionDenied(_) => FailureKind::PermissionDenied,
            CoreError::NotADirectory(_) => FailureKind::NotADirectory,
            _ => FailureKind::Unreadable,
        };
        Self {
            path,
            kind,
            message: err.to_string(),
        }
    }
}
