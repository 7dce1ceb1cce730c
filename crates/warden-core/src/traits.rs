//! Cleanup-obligation traits and the generic lifetime interface.

use std::any::Any;

use crate::cancel::CancellationToken;
use crate::error::ReleaseError;

/// A resource with an explicit release operation.
///
/// Registered on a scope with `add_disposable`; `dispose` runs exactly once,
/// either when the scope terminates or immediately if the scope is already
/// terminated at registration time. The resource is dropped right after.
pub trait Disposable {
    /// Release the resource.
    ///
    /// An `Err` is logged by the owning scope and does not stop the
    /// remaining obligations of the same termination pass.
    fn dispose(&mut self) -> Result<(), ReleaseError>;
}

/// A self-describing cleanup callback.
///
/// Unlike a bare closure, the object carries its own state and is consumed
/// by [`invoke`](ScopeAction::invoke), which gives implementors one place to
/// hand their storage back to a pool of their own.
pub trait ScopeAction {
    /// Run the action, consuming it.
    fn invoke(self: Box<Self>);
}

/// A cleanup action bound to the value it operates on.
///
/// Produced by `add_cleanup_with(value, action)`: at release, `action(value)`
/// runs once.
pub struct BoundAction<T, F> {
    value: T,
    action: F,
}

impl<T, F> BoundAction<T, F>
where
    F: FnOnce(T),
{
    /// Bind `action` to `value`.
    pub fn new(value: T, action: F) -> Self {
        Self { value, action }
    }

    /// Run the action immediately without boxing.
    pub fn call(self) {
        (self.action)(self.value)
    }
}

impl<T, F> ScopeAction for BoundAction<T, F>
where
    F: FnOnce(T),
{
    fn invoke(self: Box<Self>) {
        (*self).call()
    }
}

/// The registration surface a lifetime scope exposes to its collaborators.
///
/// Code that only needs to attach cleanup to "whatever lifetime I was given"
/// should be generic over this trait rather than over a concrete scope type.
pub trait Lifetime {
    /// Whether the lifetime has ended.
    fn is_terminated(&self) -> bool;

    /// Whether the lifetime is still active.
    fn is_alive(&self) -> bool {
        !self.is_terminated()
    }

    /// Run `action` when the lifetime ends (immediately if it already has).
    fn add_cleanup<F>(&mut self, action: F) -> &mut Self
    where
        F: FnOnce() + 'static;

    /// Run `action(value)` when the lifetime ends (immediately if it already has).
    fn add_cleanup_with<T, F>(&mut self, value: T, action: F) -> &mut Self
    where
        T: 'static,
        F: FnOnce(T) + 'static;

    /// Dispose `resource` when the lifetime ends (immediately if it already has).
    fn add_disposable<D>(&mut self, resource: D) -> &mut Self
    where
        D: Disposable + 'static;

    /// Keep `object` alive until the lifetime ends.
    ///
    /// If the lifetime already ended the object is dropped straight away.
    fn add_reference<R>(&mut self, object: R) -> &mut Self
    where
        R: Any;

    /// A cancellation token that is cancelled when the lifetime ends.
    fn token(&mut self) -> CancellationToken;
}
