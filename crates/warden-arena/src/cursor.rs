//! Borrowed, single-scope view of an arena.
//!
//! [`ScopeMut`] pairs an arena with one handle so that collaborators can be
//! written against the generic [`Lifetime`] trait and registrations can be
//! chained:
//!
//! ```
//! use warden_arena::ScopeArena;
//! use warden_core::Lifetime;
//!
//! let mut arena = ScopeArena::default();
//! let handle = arena.create();
//! arena
//!     .scope(handle)
//!     .add_cleanup(|| println!("second"))
//!     .add_cleanup(|| println!("first"));
//! arena.terminate(handle);
//! ```

use std::any::Any;

use warden_core::{CancellationToken, Disposable, Lifetime};

use crate::arena::ScopeArena;
use crate::error::ArenaError;
use crate::handle::ScopeHandle;

/// Mutable view of one scope in a [`ScopeArena`].
pub struct ScopeMut<'a> {
    arena: &'a mut ScopeArena,
    handle: ScopeHandle,
}

impl<'a> ScopeMut<'a> {
    pub(crate) fn new(arena: &'a mut ScopeArena, handle: ScopeHandle) -> Self {
        Self { arena, handle }
    }

    /// The handle this view operates on.
    pub fn handle(&self) -> ScopeHandle {
        self.handle
    }

    /// The underlying arena.
    pub fn arena(&mut self) -> &mut ScopeArena {
        &mut *self.arena
    }

    /// Terminate `child` when this scope terminates.
    pub fn add_child(&mut self, child: ScopeHandle) -> &mut Self {
        self.arena.add_child(self.handle, child);
        self
    }

    /// Restart `child` when this scope terminates.
    pub fn add_restart_child(&mut self, child: ScopeHandle) -> &mut Self {
        self.arena.add_restart_child(self.handle, child);
        self
    }

    /// Create a new scope that terminates with this one.
    pub fn create_child(&mut self) -> ScopeHandle {
        self.arena.create_child(self.handle)
    }

    /// See [`ScopeArena::terminate`].
    pub fn terminate(&mut self) -> bool {
        self.arena.terminate(self.handle)
    }

    /// See [`ScopeArena::restart`].
    pub fn restart(&mut self) -> Result<(), ArenaError> {
        self.arena.restart(self.handle)
    }
}

impl Lifetime for ScopeMut<'_> {
    fn is_terminated(&self) -> bool {
        self.arena.is_terminated(self.handle)
    }

    fn add_cleanup<F>(&mut self, action: F) -> &mut Self
    where
        F: FnOnce() + 'static,
    {
        self.arena.add_cleanup(self.handle, action);
        self
    }

    fn add_cleanup_with<T, F>(&mut self, value: T, action: F) -> &mut Self
    where
        T: 'static,
        F: FnOnce(T) + 'static,
    {
        self.arena.add_cleanup_with(self.handle, value, action);
        self
    }

    fn add_disposable<D>(&mut self, resource: D) -> &mut Self
    where
        D: Disposable + 'static,
    {
        self.arena.add_disposable(self.handle, resource);
        self
    }

    fn add_reference<R>(&mut self, object: R) -> &mut Self
    where
        R: Any,
    {
        self.arena.add_reference(self.handle, object);
        self
    }

    fn token(&mut self) -> CancellationToken {
        self.arena.token(self.handle)
    }
}
