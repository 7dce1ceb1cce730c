//! The scope arena: allocation, recycling, registration, and termination.
//!
//! [`ScopeArena`] owns every scope it hands out. Scopes are addressed by
//! generation-checked [`ScopeHandle`]s; recycling a scope bumps its entry's
//! generation so that stale handles stop resolving, and parks the boxed
//! scope instance on a bounded free list for the next [`create`].
//!
//! A handle that does not resolve is treated as a scope that has ended:
//! registrations through it run immediately, termination is a no-op, and
//! its token is already cancelled. Only [`restart`] and [`recycle`] report
//! stale handles as errors.
//!
//! # Termination order
//!
//! 1. The scope's cancellation source (if any) is cancelled and dropped.
//! 2. Overflow obligations are released last-registered first.
//! 3. The fast slot (the first registration) is released.
//! 4. The emptied overflow array goes back to the backing pool.
//!
//! Each release is isolated: an `Err` or a panic is logged, counted in
//! [`ArenaStats::release_failures`], and the pass continues.
//!
//! Child scopes are torn down on an explicit stack of teardown frames, not
//! by recursion, so arbitrarily deep scope chains terminate in constant
//! native stack. A child's frame is pushed when its parent reaches the
//! child slot and is drained completely before the parent resumes.
//!
//! [`create`]: ScopeArena::create
//! [`restart`]: ScopeArena::restart
//! [`recycle`]: ScopeArena::recycle

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use smallvec::SmallVec;

use warden_core::{
    BoundAction, CancellationToken, Disposable, ReleaseError, ScopeAction, ScopeId,
};

use crate::backing::{PoolStats, SlotArrayPool};
use crate::config::{ArenaConfig, ConfigError};
use crate::cursor::ScopeMut;
use crate::error::ArenaError;
use crate::handle::ScopeHandle;
use crate::scope::{LifetimeScope, Teardown};
use crate::slot::{Release, Slot};

/// One row of the arena's entry table.
struct Entry {
    /// Bumped on every recycle.
    generation: u32,
    /// Arena-wide creation order of the current occupant.
    sequence: u64,
    /// `None` while the entry is vacant.
    scope: Option<Box<LifetimeScope>>,
}

/// A scope mid-termination: what is left to release, and what to do after.
struct Frame {
    handle: ScopeHandle,
    teardown: Teardown,
    /// Reactivate the scope once drained (a restart-with-parent child).
    restart: bool,
}

/// Pending teardown frames, innermost last.
type FrameStack = SmallVec<[Frame; 4]>;

/// Counters describing arena activity since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Scopes allocated fresh.
    pub created: u64,
    /// Scopes served from the recycle pool.
    pub reused: u64,
    /// Scopes accepted into the recycle pool.
    pub recycled: u64,
    /// Recycled scopes dropped because the pool was full.
    pub discarded: u64,
    /// Obligations whose release returned an error or panicked.
    pub release_failures: u64,
}

/// Owner and allocator of lifetime scopes.
///
/// Not internally synchronized: an arena and its scopes are driven from a
/// single thread. Cancellation tokens handed out by the arena are the only
/// part meant to cross threads.
pub struct ScopeArena {
    config: ArenaConfig,
    entries: Vec<Entry>,
    /// Indices of vacant entries.
    vacant: Vec<u32>,
    /// Recycled scope instances, terminated and empty.
    pooled: Vec<Box<LifetimeScope>>,
    arrays: SlotArrayPool,
    root: ScopeHandle,
    /// Next value for `Entry::sequence`.
    next_sequence: u64,
    stats: ArenaStats,
}

impl ScopeArena {
    /// Create an arena with the given configuration.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ArenaConfig) -> Self {
        let arrays = SlotArrayPool::new(config.max_arrays_per_class);
        let mut arena = Self {
            config,
            entries: Vec::new(),
            vacant: Vec::new(),
            pooled: Vec::new(),
            arrays,
            root: ScopeHandle::TERMINATED,
            next_sequence: 0,
            stats: ArenaStats::default(),
        };
        arena.root = arena.create();
        arena
    }

    /// The arena configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Activity counters.
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Backing array pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.arrays.stats()
    }

    /// Number of scopes currently allocated (active or terminated).
    pub fn live_count(&self) -> usize {
        self.entries.len() - self.vacant.len()
    }

    /// Number of recycled scope instances waiting for reuse.
    pub fn pooled_count(&self) -> usize {
        self.pooled.len()
    }

    /// The arena's root scope.
    ///
    /// The root lives as long as the arena, cannot be recycled, and is
    /// terminated when the arena is dropped. Host-level obligations that
    /// must run on shutdown belong here.
    pub fn root(&self) -> ScopeHandle {
        self.root
    }

    /// Terminate and reactivate the root scope.
    ///
    /// For hosts that reload without tearing the arena down.
    pub fn reset_root(&mut self) {
        if let Err(error) = self.restart(self.root) {
            tracing::error!(%error, "root scope did not resolve");
        }
    }

    // ── Allocation ─────────────────────────────────────────────────

    /// Obtain an active scope, reusing a recycled instance when available.
    pub fn create(&mut self) -> ScopeHandle {
        let scope = match self.pooled.pop() {
            Some(mut scope) => {
                scope.reactivate();
                self.stats.reused += 1;
                scope
            }
            None => {
                self.stats.created += 1;
                Box::new(LifetimeScope::new())
            }
        };
        let id = scope.id();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let handle = match self.vacant.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.sequence = sequence;
                entry.scope = Some(scope);
                ScopeHandle::new(index, entry.generation)
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    sequence,
                    scope: Some(scope),
                });
                ScopeHandle::new(index, 0)
            }
        };
        tracing::trace!(scope = %id, %handle, "scope created");
        handle
    }

    /// Create a scope that terminates together with `parent`.
    ///
    /// If `parent` has already ended the new scope is returned terminated.
    pub fn create_child(&mut self, parent: ScopeHandle) -> ScopeHandle {
        let child = self.create();
        self.add_child(parent, child);
        child
    }

    /// Terminate a scope and return its instance to the recycle pool.
    ///
    /// Every handle to the scope becomes stale. The instance is cleared on
    /// the way into the pool, so the next [`create`](Self::create) never
    /// sees obligations from this lifetime.
    pub fn recycle(&mut self, handle: ScopeHandle) -> Result<(), ArenaError> {
        if handle == self.root {
            return Err(ArenaError::RootScope);
        }
        let index = self.resolve_index(handle)?;
        // A restart-with-parent cycle can reactivate the scope during its own
        // teardown; each pass consumes slots, so this settles.
        while self.terminate_index(index) {}

        let entry = &mut self.entries[index];
        entry.generation = entry.generation.wrapping_add(1);
        let Some(scope) = entry.scope.take() else {
            return Ok(());
        };
        self.vacant.push(index as u32);

        debug_assert!(scope.is_pristine(), "recycled scope {} not cleared", scope.id());
        if self.pooled.len() < self.config.max_pooled_scopes {
            tracing::trace!(scope = %scope.id(), %handle, "scope recycled");
            self.pooled.push(scope);
            self.stats.recycled += 1;
        } else {
            tracing::trace!(scope = %scope.id(), %handle, "scope pool full, dropping instance");
            self.stats.discarded += 1;
        }
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Whether `handle` still refers to a scope in this arena.
    pub fn contains(&self, handle: ScopeHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Read-only view of a scope.
    pub fn get(&self, handle: ScopeHandle) -> Option<&LifetimeScope> {
        let entry = self.entries.get(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.scope.as_deref()
    }

    /// The scope's id, if the handle resolves.
    pub fn id(&self, handle: ScopeHandle) -> Option<ScopeId> {
        self.get(handle).map(LifetimeScope::id)
    }

    /// Whether the scope has ended. Stale handles read as terminated.
    pub fn is_terminated(&self, handle: ScopeHandle) -> bool {
        self.get(handle).is_none_or(LifetimeScope::is_terminated)
    }

    /// Whether the scope is active.
    pub fn is_alive(&self, handle: ScopeHandle) -> bool {
        !self.is_terminated(handle)
    }

    /// Number of obligations the scope currently holds.
    pub fn len(&self, handle: ScopeHandle) -> usize {
        self.get(handle).map_or(0, LifetimeScope::len)
    }

    /// A cursor for chained registration on one scope.
    pub fn scope(&mut self, handle: ScopeHandle) -> ScopeMut<'_> {
        ScopeMut::new(self, handle)
    }

    // ── Registration ───────────────────────────────────────────────

    /// Run `action` when the scope terminates.
    pub fn add_cleanup<F>(&mut self, handle: ScopeHandle, action: F)
    where
        F: FnOnce() + 'static,
    {
        self.register(handle, Slot::Action(Box::new(action)));
    }

    /// Run `action(value)` when the scope terminates.
    pub fn add_cleanup_with<T, F>(&mut self, handle: ScopeHandle, value: T, action: F)
    where
        T: 'static,
        F: FnOnce(T) + 'static,
    {
        self.register(handle, Slot::SelfAction(Box::new(BoundAction::new(value, action))));
    }

    /// Invoke a self-describing action when the scope terminates.
    pub fn add_action(&mut self, handle: ScopeHandle, action: Box<dyn ScopeAction>) {
        self.register(handle, Slot::SelfAction(action));
    }

    /// Dispose `resource` when the scope terminates.
    pub fn add_disposable<D>(&mut self, handle: ScopeHandle, resource: D)
    where
        D: Disposable + 'static,
    {
        self.register(handle, Slot::Disposable(Box::new(resource)));
    }

    /// Keep `object` alive until the scope terminates.
    ///
    /// If the scope has already ended the object is dropped immediately.
    pub fn add_reference<R>(&mut self, handle: ScopeHandle, object: R)
    where
        R: Any,
    {
        if self.is_alive(handle) {
            self.register(handle, Slot::Reference(Box::new(object)));
        }
    }

    /// Terminate `child` when `parent` terminates.
    ///
    /// If `parent` has already ended, `child` is terminated now. A scope
    /// may be registered under several parents; whichever terminates first
    /// ends it and the rest find it already terminated.
    pub fn add_child(&mut self, parent: ScopeHandle, child: ScopeHandle) {
        self.register(parent, Slot::TerminateChild(child));
    }

    /// Restart `child` when `parent` terminates.
    ///
    /// If `parent` has already ended, `child` is restarted now.
    pub fn add_restart_child(&mut self, parent: ScopeHandle, child: ScopeHandle) {
        self.register(parent, Slot::RestartChild(child));
    }

    /// A token cancelled when the scope terminates.
    ///
    /// The underlying source is created on first request. Terminated and
    /// stale scopes get a token that is already cancelled.
    pub fn token(&mut self, handle: ScopeHandle) -> CancellationToken {
        match self.scope_mut(handle) {
            Some(scope) => scope.token(),
            None => CancellationToken::new_cancelled(),
        }
    }

    fn register(&mut self, handle: ScopeHandle, slot: Slot) {
        let default_capacity = self.config.default_capacity;
        let Self {
            entries, arrays, ..
        } = self;
        let active = entries
            .get_mut(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.scope.as_deref_mut())
            .filter(|scope| !scope.is_terminated());
        match active {
            Some(scope) => scope.push(slot, arrays, default_capacity),
            None => self.release_now(handle, slot),
        }
    }

    // ── Termination ────────────────────────────────────────────────

    /// End the scope, releasing every obligation in reverse order.
    ///
    /// Returns `true` if this call performed the transition; terminating a
    /// terminated or stale scope is a no-op returning `false`.
    pub fn terminate(&mut self, handle: ScopeHandle) -> bool {
        match self.resolve_index(handle) {
            Ok(index) => self.terminate_index(index),
            Err(_) => false,
        }
    }

    /// Alias of [`terminate`](Self::terminate).
    pub fn dispose(&mut self, handle: ScopeHandle) -> bool {
        self.terminate(handle)
    }

    /// Terminate the scope (if active) and make it active again.
    ///
    /// Obligations registered before the restart run exactly once, during
    /// the termination half. The restarted scope gets a fresh, non-cancelled
    /// token on its next request.
    pub fn restart(&mut self, handle: ScopeHandle) -> Result<(), ArenaError> {
        let index = self.resolve_index(handle)?;
        self.terminate_index(index);
        if let Some(scope) = self.entries[index].scope.as_deref_mut() {
            scope.reactivate();
        }
        Ok(())
    }

    fn terminate_index(&mut self, index: usize) -> bool {
        match self.begin_frame(index, false) {
            Some(frame) => {
                let mut stack = FrameStack::new();
                stack.push(frame);
                self.drain(stack);
                true
            }
            None => false,
        }
    }

    /// Flip the scope at `index` to terminated and cancel its token.
    ///
    /// Returns `None` if the entry is vacant or the scope already ended.
    fn begin_frame(&mut self, index: usize, restart: bool) -> Option<Frame> {
        let entry = &mut self.entries[index];
        let handle = ScopeHandle::new(index as u32, entry.generation);
        let scope = entry.scope.as_deref_mut()?;
        let id = scope.id();
        let mut teardown = scope.begin_termination()?;
        tracing::debug!(scope = %id, %handle, obligations = teardown.len(), "terminating scope");

        if let Some(source) = teardown.cancellation.take() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| source.cancel())) {
                self.report_failure(handle, "cancellation listener", ReleaseError::from_panic(payload));
            }
        }
        Some(Frame {
            handle,
            teardown,
            restart,
        })
    }

    /// Release every pending frame, innermost first.
    fn drain(&mut self, mut stack: FrameStack) {
        while let Some(frame) = stack.last_mut() {
            let owner = frame.handle;
            match frame.teardown.next_slot() {
                Some(slot) => self.release_slot(owner, slot, &mut stack),
                None => {
                    if let Some(done) = stack.pop() {
                        self.finish_frame(done);
                    }
                }
            }
        }
    }

    fn finish_frame(&mut self, frame: Frame) {
        self.arrays.give_back(frame.teardown.overflow);
        if frame.restart {
            if let Some(scope) = self.scope_mut(frame.handle) {
                scope.reactivate();
            }
        }
    }

    /// Release one obligation on behalf of `owner`, outside any teardown.
    fn release_now(&mut self, owner: ScopeHandle, slot: Slot) {
        let mut stack = FrameStack::new();
        self.release_slot(owner, slot, &mut stack);
        self.drain(stack);
    }

    /// Release one obligation; child scopes become new frames on `stack`.
    fn release_slot(&mut self, owner: ScopeHandle, slot: Slot, stack: &mut FrameStack) {
        let kind = slot.kind();
        match slot.release() {
            Ok(Release::Done) => {}
            Ok(Release::TerminateChild(child)) => {
                if let Ok(index) = self.resolve_index(child) {
                    stack.extend(self.begin_frame(index, false));
                }
            }
            Ok(Release::RestartChild(child)) => match self.resolve_index(child) {
                Ok(index) => match self.begin_frame(index, true) {
                    Some(frame) => stack.push(frame),
                    // Already terminated (possibly mid-teardown further down
                    // the stack): restarting it is just reactivation.
                    None => {
                        if let Some(scope) = self.entries[index].scope.as_deref_mut() {
                            scope.reactivate();
                        }
                    }
                },
                Err(error) => {
                    tracing::trace!(scope = %owner, %error, "restart-with-parent child is gone");
                }
            },
            Err(error) => {
                let what = format!("{kind:?}");
                self.report_failure(owner, &what, error);
            }
        }
    }

    fn report_failure(&mut self, owner: ScopeHandle, what: &str, error: ReleaseError) {
        self.stats.release_failures += 1;
        tracing::warn!(scope = %owner, obligation = what, %error, "cleanup obligation failed");
    }

    // ── Handle resolution ──────────────────────────────────────────

    fn resolve_index(&self, handle: ScopeHandle) -> Result<usize, ArenaError> {
        let index = handle.index as usize;
        match self.entries.get(index) {
            Some(entry) if entry.generation == handle.generation && entry.scope.is_some() => {
                Ok(index)
            }
            Some(entry) => Err(ArenaError::StaleHandle {
                index: handle.index,
                handle_generation: handle.generation,
                current_generation: Some(entry.generation),
            }),
            None => Err(ArenaError::StaleHandle {
                index: handle.index,
                handle_generation: handle.generation,
                current_generation: None,
            }),
        }
    }

    fn scope_mut(&mut self, handle: ScopeHandle) -> Option<&mut LifetimeScope> {
        let entry = self.entries.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.scope.as_deref_mut()
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::with_valid_config(ArenaConfig::default())
    }
}

impl Drop for ScopeArena {
    /// Terminates the root, then every scope still active, newest first.
    fn drop(&mut self) {
        self.terminate(self.root);
        let mut active: Vec<(u64, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let scope = entry.scope.as_deref()?;
                (!scope.is_terminated()).then_some((entry.sequence, index))
            })
            .collect();
        if active.is_empty() {
            return;
        }
        tracing::debug!(count = active.len(), "terminating scopes left active at arena drop");
        active.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (_, index) in active {
            self.terminate_index(index);
        }
    }
}
