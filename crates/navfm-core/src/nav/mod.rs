//! Navigation logic for navfm.
//!
//! [`state::NavigationState`] holds the pure state machine with its
//! back/forward [`history::History`]; [`navigator::Navigator`] drives it
//! against a [`crate::host::Host`]. [`filter`] projects a listing into what
//! a view shows.

pub mod filter;
pub mod history;
pub mod navigator;
pub mod state;
