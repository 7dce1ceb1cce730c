//! Workload builders shared by the Warden benchmarks.
//!
//! - [`populate`]: register `n` no-op obligations on one scope
//! - [`build_tree`]: a scope tree of fixed depth and fanout
//! - [`churn`]: create/populate/recycle cycles against one arena

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use warden_arena::{ScopeArena, ScopeHandle};

/// Obligation counts covering the inline slot, the first overflow rental,
/// and repeated growth.
pub const OBLIGATION_COUNTS: [usize; 5] = [0, 1, 2, 16, 256];

/// Register `n` no-op cleanup actions on `scope`.
pub fn populate(arena: &mut ScopeArena, scope: ScopeHandle, n: usize) {
    for _ in 0..n {
        arena.add_cleanup(scope, || {});
    }
}

/// Build a tree of `depth` levels under a fresh root, `fanout` children per
/// scope, each scope holding `per_scope` obligations.
///
/// Returns every scope in the tree, root first.
pub fn build_tree(
    arena: &mut ScopeArena,
    depth: usize,
    fanout: usize,
    per_scope: usize,
) -> Vec<ScopeHandle> {
    let root = arena.create();
    populate(arena, root, per_scope);
    let mut scopes = vec![root];
    let mut frontier = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(frontier.len() * fanout);
        for &parent in &frontier {
            for _ in 0..fanout {
                let child = arena.create_child(parent);
                populate(arena, child, per_scope);
                next.push(child);
            }
        }
        scopes.extend_from_slice(&next);
        frontier = next;
    }
    scopes
}

/// Run `cycles` create → populate → recycle rounds.
pub fn churn(arena: &mut ScopeArena, cycles: usize, per_scope: usize) {
    for _ in 0..cycles {
        let scope = arena.create();
        populate(arena, scope, per_scope);
        // Freshly created, non-root handles always resolve.
        let _ = arena.recycle(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_registers_requested_count() {
        let mut arena = ScopeArena::default();
        let scope = arena.create();
        populate(&mut arena, scope, 17);
        assert_eq!(arena.len(scope), 17);
    }

    #[test]
    fn tree_size_matches_geometry() {
        let mut arena = ScopeArena::default();
        let scopes = build_tree(&mut arena, 3, 2, 1);
        assert_eq!(scopes.len(), 1 + 2 + 4 + 8);
        // Each scope holds its own obligation plus one entry per child.
        assert_eq!(arena.len(scopes[0]), 3);
        assert!(arena.terminate(scopes[0]));
        assert!(scopes.iter().all(|&s| arena.is_terminated(s)));
    }

    #[test]
    fn churn_reuses_instances() {
        let mut arena = ScopeArena::default();
        churn(&mut arena, 10, 4);
        let stats = arena.stats();
        assert_eq!(stats.created, 2);
        assert_eq!(stats.reused, 9);
        assert_eq!(arena.pooled_count(), 1);
    }
}
