//! Navigation history with back/forward support.

use crate::fs::path::CanonicalPath;

/// Immutable navigation history with back/forward stacks.
///
/// Every mutation returns a **new** `History` instance. The back stack is
/// ordered oldest first (most recent last); the forward stack is ordered
/// most-recently-undone first. Pushing a new path clears the forward stack
/// (same semantics as a web browser).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    back_stack: Vec<CanonicalPath>,
    forward_stack: Vec<CanonicalPath>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `path` onto the back stack and clears the forward stack.
    pub fn push(&self, path: CanonicalPath) -> Self {
        let mut back_stack = self.back_stack.clone();
        back_stack.push(path);
        Self {
            back_stack,
            forward_stack: Vec::new(),
        }
    }

    /// Go back one step from `current`.
    ///
    /// Returns the new History and the path to load, or `None` if the back
    /// stack is empty. `current` (when known) goes to the front of the
    /// forward stack.
    pub fn go_back(&self, current: Option<&CanonicalPath>) -> Option<(Self, CanonicalPath)> {
        let mut back_stack = self.back_stack.clone();
        let path = back_stack.pop()?;
        let mut forward_stack = self.forward_stack.clone();
        if let Some(current) = current {
            forward_stack.insert(0, current.clone());
        }
        Some((
            Self {
                back_stack,
                forward_stack,
            },
            path,
        ))
    }

    /// Go forward one step from `current`.
    ///
    /// Returns the new History and the path to load, or `None` if the
    /// forward stack is empty. `current` (when known) is pushed onto the
    /// back stack.
    pub fn go_forward(&self, current: Option<&CanonicalPath>) -> Option<(Self, CanonicalPath)> {
        if self.forward_stack.is_empty() {
            return None;
        }
        let mut forward_stack = self.forward_stack.clone();
        let path = forward_stack.remove(0);
        let mut back_stack = self.back_stack.clone();
        if let Some(current) = current {
            back_stack.push(current.clone());
        }
        Some((
            Self {
                back_stack,
                forward_stack,
            },
            path,
        ))
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward_stack.is_empty()
    }

    /// Previously visited paths, most recent last.
    pub fn back_stack(&self) -> &[CanonicalPath] {
        &self.back_stack
    }

    /// Paths available for redo, most recently undone first.
    pub fn forward_stack(&self) -> &[CanonicalPath] {
        &self.forward_stack
    }
}
