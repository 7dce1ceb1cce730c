//! The lifetime scope record.
//!
//! A [`LifetimeScope`] stores its first obligation inline in a fast slot and
//! every later one in an overflow array rented from a [`SlotArrayPool`].
//! Scopes with zero or one obligation never touch the pool; the first
//! overflow rental is sized from the configured growth floor, so a scope
//! with a handful of obligations allocates at most once.
//!
//! The scope itself only knows how to store obligations and how to hand
//! them over for teardown. Releasing them, which may cascade into child
//! scopes, is driven by the owning [`ScopeArena`](crate::ScopeArena).

use warden_core::{CancellationSource, CancellationToken, ScopeId};

use crate::backing::SlotArrayPool;
use crate::slot::Slot;

/// Everything a scope owned at the moment it terminated.
///
/// Release order is `cancellation`, then `overflow` from last to first,
/// then `fast`.
pub(crate) struct Teardown {
    pub(crate) cancellation: Option<CancellationSource>,
    pub(crate) overflow: Vec<Slot>,
    pub(crate) fast: Slot,
}

impl Teardown {
    /// Number of obligations to release.
    pub(crate) fn len(&self) -> usize {
        self.overflow.len() + usize::from(!self.fast.is_empty())
    }

    /// The next obligation in release order, or `None` once drained.
    ///
    /// The drained overflow array keeps its capacity for the backing pool.
    pub(crate) fn next_slot(&mut self) -> Option<Slot> {
        if let Some(slot) = self.overflow.pop() {
            return Some(slot);
        }
        if self.fast.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.fast))
    }
}

/// A set of cleanup obligations released together, in reverse order.
pub struct LifetimeScope {
    id: ScopeId,
    terminated: bool,
    /// First registration; avoids any array for single-obligation scopes.
    fast: Slot,
    /// Registrations after the first, in registration order.
    overflow: Vec<Slot>,
    /// Created on first token request while active.
    cancellation: Option<CancellationSource>,
}

impl LifetimeScope {
    pub(crate) fn new() -> Self {
        Self {
            id: ScopeId::next(),
            terminated: false,
            fast: Slot::Empty,
            overflow: Vec::new(),
            cancellation: None,
        }
    }

    /// The scope's process-unique id.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Whether the scope has terminated and not been restarted since.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of obligations currently held.
    pub fn len(&self) -> usize {
        self.overflow.len() + usize::from(!self.fast.is_empty())
    }

    /// Whether the scope holds no obligations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the rented overflow array (0 if none is held).
    pub fn overflow_capacity(&self) -> usize {
        self.overflow.capacity()
    }

    /// Whether a cancellation source has been created for this activation.
    pub fn has_cancellation(&self) -> bool {
        self.cancellation.is_some()
    }

    /// Store an obligation.
    ///
    /// Callers check [`is_terminated`](Self::is_terminated) first: a
    /// terminated scope releases new obligations instead of storing them.
    pub(crate) fn push(&mut self, slot: Slot, arrays: &mut SlotArrayPool, default_capacity: usize) {
        debug_assert!(!self.terminated, "push on terminated scope {}", self.id);
        if self.fast.is_empty() && self.overflow.is_empty() {
            self.fast = slot;
            return;
        }
        if self.overflow.len() == self.overflow.capacity() {
            let size = self.overflow.len().max(default_capacity);
            let mut grown = arrays.rent(size * 2);
            grown.append(&mut self.overflow);
            arrays.give_back(std::mem::replace(&mut self.overflow, grown));
        }
        self.overflow.push(slot);
    }

    /// The cancellation token for the current activation.
    pub(crate) fn token(&mut self) -> CancellationToken {
        if self.terminated {
            return CancellationToken::new_cancelled();
        }
        self.cancellation
            .get_or_insert_with(CancellationSource::new)
            .token()
    }

    /// Flip to terminated and hand over everything that must be released.
    ///
    /// Returns `None` if the scope was already terminated, which is what
    /// makes termination idempotent: the flag is set before any obligation
    /// runs, so re-entrant or cyclic termination requests stop here.
    pub(crate) fn begin_termination(&mut self) -> Option<Teardown> {
        if self.terminated {
            return None;
        }
        self.terminated = true;
        Some(Teardown {
            cancellation: self.cancellation.take(),
            overflow: std::mem::take(&mut self.overflow),
            fast: std::mem::take(&mut self.fast),
        })
    }

    /// Return the scope to the active state.
    ///
    /// Idempotent: a scope restarted from inside its own termination cascade
    /// is already active by the time the outer restart completes.
    pub(crate) fn reactivate(&mut self) {
        debug_assert!(self.is_empty(), "reactivating scope {} with live slots", self.id);
        self.terminated = false;
    }

    /// Whether the scope is terminated and holds nothing, i.e. safe to pool.
    pub(crate) fn is_pristine(&self) -> bool {
        self.terminated
            && self.fast.is_empty()
            && self.overflow.capacity() == 0
            && self.cancellation.is_none()
    }
}
