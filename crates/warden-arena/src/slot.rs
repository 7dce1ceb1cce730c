//! Tagged cleanup obligations.
//!
//! A [`Slot`] is one obligation owned by a scope. Each variant carries
//! exactly the payload its release needs, so releasing is a plain `match`
//! with no runtime type inspection. Releasing consumes the slot, which is
//! what makes double release impossible.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use warden_core::{Disposable, ReleaseError, ScopeAction};

use crate::handle::ScopeHandle;

/// The tag of a [`Slot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Holds nothing.
    None,
    /// Kept alive until release; dropping it is the release.
    Reference,
    /// Released by [`Disposable::dispose`].
    Disposable,
    /// A closure run at release.
    Action,
    /// A self-describing [`ScopeAction`] consumed at release.
    SelfAction,
    /// A child scope terminated at release.
    TerminateChild,
    /// A child scope restarted at release.
    RestartChild,
}

/// One cleanup obligation.
#[derive(Default)]
pub enum Slot {
    /// No obligation.
    #[default]
    Empty,
    /// An object kept alive for the owner's duration.
    Reference(Box<dyn Any>),
    /// A resource disposed at release.
    Disposable(Box<dyn Disposable>),
    /// A closure run at release.
    Action(Box<dyn FnOnce()>),
    /// A self-describing action run at release.
    SelfAction(Box<dyn ScopeAction>),
    /// A child scope to terminate.
    TerminateChild(ScopeHandle),
    /// A child scope to restart.
    RestartChild(ScopeHandle),
}

/// What is left to do after a slot's local release.
///
/// Child slots cannot be released by the slot itself: terminating or
/// restarting a scope needs the arena that owns it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Release {
    Done,
    TerminateChild(ScopeHandle),
    RestartChild(ScopeHandle),
}

impl Slot {
    /// The slot's tag.
    pub fn kind(&self) -> SlotKind {
        match self {
            Self::Empty => SlotKind::None,
            Self::Reference(_) => SlotKind::Reference,
            Self::Disposable(_) => SlotKind::Disposable,
            Self::Action(_) => SlotKind::Action,
            Self::SelfAction(_) => SlotKind::SelfAction,
            Self::TerminateChild(_) => SlotKind::TerminateChild,
            Self::RestartChild(_) => SlotKind::RestartChild,
        }
    }

    /// Whether the slot holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Release the slot, consuming it.
    ///
    /// Panics raised by the obligation (including from a `Drop` impl of the
    /// payload) are caught and reported as [`ReleaseError::Panicked`].
    pub(crate) fn release(self) -> Result<Release, ReleaseError> {
        let local = match self {
            Self::TerminateChild(child) => return Ok(Release::TerminateChild(child)),
            Self::RestartChild(child) => return Ok(Release::RestartChild(child)),
            local => local,
        };
        panic::catch_unwind(AssertUnwindSafe(move || match local {
            Self::Disposable(mut resource) => resource.dispose(),
            Self::Action(action) => {
                action();
                Ok(())
            }
            Self::SelfAction(action) => {
                action.invoke();
                Ok(())
            }
            // References release by being dropped here.
            _ => Ok(()),
        }))
        .map_err(ReleaseError::from_panic)?
        .map(|()| Release::Done)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerminateChild(child) | Self::RestartChild(child) => f
                .debug_tuple("Slot")
                .field(&self.kind())
                .field(child)
                .finish(),
            _ => f.debug_tuple("Slot").field(&self.kind()).finish(),
        }
    }
}
