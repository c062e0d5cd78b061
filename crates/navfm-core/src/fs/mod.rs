//! Filesystem side of the navigation engine.
//!
//! Path resolution ([`path::resolve`]), directory entries
//! ([`entry::DirectoryEntry`]), single-level listing
//! ([`lister::list_directory`]), storage roots ([`roots::list_roots`]), and
//! the rename/open operations ([`ops`]).

pub mod entry;
pub mod lister;
pub mod ops;
pub mod path;
pub mod roots;

pub use path::{breadcrumbs, resolve, Breadcrumb, CanonicalPath, PathStyle};
pub use roots::DriveRoot;
