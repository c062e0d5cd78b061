//! navfm core library: UI-agnostic navigation and listing engine.
//!
//! `navfm-core` turns user-typed paths into validated, sorted, and filtered
//! directory views, keeps back/forward history, makes sure only the latest
//! of several concurrent directory loads is shown, and resolves per-entry
//! icons. Every OS call goes through the [`host::Host`] trait so that any
//! frontend (and the test suite) can drive the same logic.
//!
//! # Modules
//!
//! - [`fs`]: Path resolution, directory entries and listing, storage roots, rename/open.
//! - [`nav`]: Navigation state machine, history, the async [`Navigator`], view projection.
//! - [`icon`]: Icon resolution for plain files, `.lnk` and `.url` shortcuts, plus a cache.
//! - [`host`]: The OS boundary: [`Host`], [`NativeHost`], and the in-memory [`MemoryHost`].
//! - [`config`]: TOML-based settings.
//! - [`event`]: Command and event types for UI ↔ Core communication.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod host;
pub mod icon;
pub mod nav;

pub use config::settings::Config;
pub use error::{CoreError, CoreResult, FailureKind, ListingFailure};
pub use event::{Command, Event};
pub use fs::entry::DirectoryEntry;
pub use fs::lister::list_directory;
pub use fs::ops::{is_valid_filename, rename_entry};
pub use fs::path::{resolve, CanonicalPath};
pub use fs::roots::{list_roots, spawn_root_poller, DriveRoot};
pub use host::{Host, MemoryHost, NativeHost};
pub use icon::{IconCache, IconResolver};
pub use nav::filter::{project, SortDirection, SortField, ViewPreferences};
pub use nav::history::History;
pub use nav::navigator::Navigator;
pub use nav::state::{LoadOutcome, LoadTicket, NavigationState};
