//! Generation-checked scope handles.
//!
//! A [`ScopeHandle`] names one logical lifetime of one arena slot. Recycling
//! a scope bumps its slot's generation, so every handle issued before the
//! recycle stops resolving and the next lifetime of that slot can never be
//! reached through an old handle.

use std::fmt;

/// Handle to a scope owned by a [`ScopeArena`](crate::ScopeArena).
///
/// Handles are plain `Copy` values; holding one does not keep the scope
/// alive. A handle that no longer resolves behaves as a terminated scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct ScopeHandle {
    /// Index of the slot in the arena's entry table.
    pub(crate) index: u32,
    /// Slot generation at the time the handle was issued.
    pub(crate) generation: u32,
}

impl ScopeHandle {
    /// A handle that never resolves.
    ///
    /// It reads as terminated in every arena: cleanup registered through it
    /// runs immediately and its token is already cancelled.
    pub const TERMINATED: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this handle points at.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The slot generation this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::TERMINATED {
            return write!(f, "ScopeHandle(terminated)");
        }
        write!(f, "ScopeHandle(idx={}, gen={})", self.index, self.generation)
    }
}
