//! Commands whose side effects live exactly as long as one execution.
//!
//! A [`ScopedCommand`] owns a scope. Each [`execute`](ScopedCommand::execute)
//! restarts that scope before running the command body, so everything the
//! previous execution registered is torn down first, and
//! [`release`](ScopedCommand::release) tears down the last execution.

use crate::arena::ScopeArena;
use crate::cursor::ScopeMut;
use crate::error::ArenaError;
use crate::handle::ScopeHandle;

/// A re-runnable action bound to a private lifetime scope.
pub struct ScopedCommand<F> {
    scope: ScopeHandle,
    action: Option<F>,
}

impl<F> ScopedCommand<F>
where
    F: FnMut(&mut ScopeMut<'_>),
{
    /// Create a command with its own scope in `arena`.
    pub fn new(arena: &mut ScopeArena, action: F) -> Self {
        Self {
            scope: arena.create(),
            action: Some(action),
        }
    }

    /// The command's scope.
    pub fn scope(&self) -> ScopeHandle {
        self.scope
    }

    /// Whether the command still has an action to run.
    pub fn is_bound(&self) -> bool {
        self.action.is_some()
    }

    /// Replace the command body, ending the previous execution's lifetime.
    pub fn rebind(&mut self, arena: &mut ScopeArena, action: F) -> Result<(), ArenaError> {
        arena.restart(self.scope)?;
        self.action = Some(action);
        Ok(())
    }

    /// Restart the scope and run the body against it.
    ///
    /// A released command restarts its scope but runs nothing.
    pub fn execute(&mut self, arena: &mut ScopeArena) -> Result<(), ArenaError> {
        arena.restart(self.scope)?;
        if let Some(action) = self.action.as_mut() {
            action(&mut arena.scope(self.scope));
        }
        Ok(())
    }

    /// Tear down the last execution and drop the body.
    pub fn release(&mut self, arena: &mut ScopeArena) {
        arena.terminate(self.scope);
        self.action = None;
    }

    /// Release the command and hand its scope back to the arena pool.
    pub fn recycle(mut self, arena: &mut ScopeArena) -> Result<(), ArenaError> {
        self.release(arena);
        arena.recycle(self.scope)
    }
}
