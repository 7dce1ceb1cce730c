//! Process-unique scope identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ScopeId`] allocation.
static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a lifetime scope instance.
///
/// Allocated from a monotonic atomic counter via [`ScopeId::next`]. The id
/// exists for tracing and debugging only; no behaviour depends on it. A
/// recycled scope instance keeps the id it was created with, so log lines
/// for one pooled instance can be correlated across its reuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Allocate a fresh, unique id. Thread-safe.
    pub fn next() -> Self {
        Self(SCOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let a = ScopeId::next();
        let b = ScopeId::next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| ScopeId::next()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<ScopeId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
