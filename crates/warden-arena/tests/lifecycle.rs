//! Integration test: scope lifecycle scenarios.
//!
//! Exercises registration, cascading termination, failure isolation, and
//! recycling through the public API only.

use warden_arena::{ArenaConfig, ScopeArena, ScopeHandle};
use warden_core::Lifetime;
use warden_test_utils::{init_test_logging, ReleaseLog};

// ── Ordering ───────────────────────────────────────────────────────

#[test]
fn nested_child_terminates_before_earlier_siblings() {
    init_test_logging();
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let parent = arena.create();
    let child = arena.create();
    let child_token = arena.token(child);

    arena.add_disposable(parent, log.disposable("A"));
    let witness = log.clone();
    arena.add_cleanup(parent, move || {
        if child_token.is_cancelled() {
            witness.record("C");
        }
        witness.record("B");
    });
    arena.add_child(parent, child);
    arena.add_disposable(child, log.disposable("D"));

    assert!(arena.terminate(parent));

    assert_eq!(log.entries(), vec!["D", "C", "B", "A"]);
    assert!(arena.is_terminated(child));
}

#[test]
fn child_terminated_before_parent_termination_returns() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let parent = arena.create();
    let child = arena.create_child(parent);
    for label in ["c1", "c2", "c3"] {
        arena.add_cleanup(child, log.action(label));
    }
    arena.terminate(parent);
    assert_eq!(log.entries(), vec!["c3", "c2", "c1"]);
    assert!(arena.is_terminated(child));
    assert_eq!(arena.len(child), 0);
}

#[test]
fn deep_chain_terminates_leaf_first() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let root = arena.create();
    let mut current = root;
    for depth in 0..32 {
        let next = arena.create_child(current);
        arena.add_cleanup(next, log.action(format!("depth {depth}")));
        current = next;
    }
    arena.terminate(root);
    let entries = log.entries();
    assert_eq!(entries.len(), 32);
    assert_eq!(entries[0], "depth 0");
    assert_eq!(entries[31], "depth 31");
}

#[test]
fn very_deep_chain_terminates() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let root = arena.create();
    let mut current = root;
    for _ in 0..100_000 {
        current = arena.create_child(current);
    }
    arena.add_cleanup(current, log.action("leaf"));

    assert!(arena.terminate(root));
    assert!(arena.is_terminated(current));
    assert_eq!(log.entries(), vec!["leaf"]);
}

#[test]
fn shared_child_released_once_across_parents() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let first = arena.create();
    let second = arena.create();
    let shared = arena.create();
    arena.add_child(first, shared);
    arena.add_child(second, shared);
    arena.add_cleanup(shared, log.action("shared"));

    arena.terminate(first);
    arena.terminate(second);
    assert_eq!(log.count("shared"), 1);
}

// ── Post-termination registration ──────────────────────────────────

#[test]
fn disposable_after_termination_released_before_return() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    arena.terminate(scope);

    arena.add_disposable(scope, log.disposable("X"));
    assert_eq!(log.entries(), vec!["X"]);

    arena.terminate(scope);
    arena.terminate(scope);
    assert_eq!(log.count("X"), 1);
}

#[test]
fn restart_child_on_terminated_parent_restarts_now() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let parent = arena.create();
    let child = arena.create();
    arena.add_cleanup(child, log.action("child"));
    arena.terminate(parent);

    arena.add_restart_child(parent, child);
    assert_eq!(log.entries(), vec!["child"]);
    assert!(arena.is_alive(child));
}

// ── Failure isolation ──────────────────────────────────────────────

#[test]
fn failing_middle_obligation_does_not_block_neighbours() {
    init_test_logging();
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    arena.add_disposable(scope, log.disposable("first"));
    arena.add_disposable(scope, log.failing_disposable("middle"));
    arena.add_disposable(scope, log.disposable("third"));

    arena.terminate(scope);
    assert_eq!(log.entries(), vec!["third", "middle", "first"]);
    assert_eq!(arena.stats().release_failures, 1);
}

#[test]
fn panicking_middle_obligation_does_not_block_neighbours() {
    init_test_logging();
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    arena.add_cleanup(scope, log.action("first"));
    arena.add_disposable(scope, log.panicking_disposable("middle"));
    arena.add_cleanup(scope, log.action("third"));

    arena.terminate(scope);
    assert_eq!(log.entries(), vec!["third", "middle", "first"]);
    assert_eq!(arena.stats().release_failures, 1);
}

#[test]
fn failing_fast_slot_still_returns_overflow_to_pool() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    arena.add_cleanup(scope, log.panicking_action("fast"));
    arena.add_cleanup(scope, log.action("overflow"));

    arena.terminate(scope);
    assert_eq!(log.entries(), vec!["overflow", "fast"]);
    assert_eq!(arena.pool_stats().returns, 1);
}

#[test]
fn panicking_cancel_listener_does_not_block_release() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    arena.token(scope).on_cancel(|| panic!("listener"));
    arena.add_cleanup(scope, log.action("cleanup"));

    arena.terminate(scope);
    assert_eq!(log.entries(), vec!["cleanup"]);
    assert_eq!(arena.stats().release_failures, 1);
}

// ── Recycling ──────────────────────────────────────────────────────

#[test]
fn recycled_scope_starts_clean() {
    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    for i in 0..10 {
        arena.add_cleanup(scope, log.action(format!("old {i}")));
    }
    let _token = arena.token(scope);
    arena.recycle(scope).unwrap();
    assert_eq!(log.len(), 10);

    let fresh = arena.create();
    assert_eq!(fresh.index(), scope.index());
    let view = arena.get(fresh).unwrap();
    assert!(view.is_empty());
    assert!(!view.is_terminated());
    assert!(!view.has_cancellation());
    assert_eq!(view.overflow_capacity(), 0);

    arena.terminate(fresh);
    assert_eq!(log.len(), 10);
}

#[test]
fn pool_recycles_up_to_default_bound() {
    let mut arena = ScopeArena::default();
    let bound = ArenaConfig::DEFAULT_MAX_POOLED_SCOPES;
    let handles: Vec<ScopeHandle> = (0..bound + 10).map(|_| arena.create()).collect();
    for handle in handles {
        arena.recycle(handle).unwrap();
    }
    assert_eq!(arena.pooled_count(), bound);
    assert_eq!(arena.stats().discarded, 10);

    let reused: Vec<ScopeHandle> = (0..bound).map(|_| arena.create()).collect();
    assert_eq!(arena.pooled_count(), 0);
    assert_eq!(arena.stats().reused, bound as u64);
    assert!(reused.iter().all(|&h| arena.is_alive(h)));
}

#[test]
fn lifetime_trait_drives_any_scope() {
    fn open_session<L: Lifetime>(lifetime: &mut L, log: &ReleaseLog) {
        lifetime
            .add_disposable(log.disposable("connection"))
            .add_cleanup(log.action("flush"))
            .add_reference(String::from("buffer"));
    }

    let log = ReleaseLog::new();
    let mut arena = ScopeArena::default();
    let handle = arena.create();
    open_session(&mut arena.scope(handle), &log);
    assert_eq!(arena.len(handle), 3);
    arena.terminate(handle);
    assert_eq!(log.entries(), vec!["flush", "connection"]);
}

#[test]
fn dropping_arena_releases_everything_once() {
    let log = ReleaseLog::new();
    {
        let mut arena = ScopeArena::default();
        let root = arena.root();
        let parent = arena.create_child(root);
        let orphan = arena.create();
        arena.add_cleanup(parent, log.action("parent"));
        arena.add_cleanup(orphan, log.action("orphan"));
        arena.add_cleanup(root, log.action("root"));
    }
    assert_eq!(log.entries(), vec!["root", "parent", "orphan"]);
}
