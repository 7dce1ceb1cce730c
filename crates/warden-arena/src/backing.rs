//! Size-classed pool of slot arrays.
//!
//! [`SlotArrayPool`] lends `Vec<Slot>` backing arrays to scopes whose
//! obligations overflow the inline fast slot, and takes them back when the
//! scope terminates or grows. Arrays are bucketed by power-of-two capacity
//! class; a rent is served from the smallest class that fits the request,
//! falling back to a fresh allocation when that class is empty.
//!
//! The pool never fails: an empty class means a fresh `Vec`, a full class
//! means the returned array is dropped.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::slot::Slot;

/// Free arrays of a single capacity class.
type FreeList = SmallVec<[Vec<Slot>; 4]>;

/// Counters describing pool traffic since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total `rent` calls.
    pub rents: u64,
    /// Rents served from a retained array.
    pub hits: u64,
    /// Rents that had to allocate.
    pub allocations: u64,
    /// Arrays accepted back into the pool.
    pub returns: u64,
    /// Arrays dropped because their class was full.
    pub discarded: u64,
}

/// Pool of reusable slot arrays keyed by capacity class.
pub struct SlotArrayPool {
    /// Capacity class (a power of two) → free arrays of that class.
    classes: IndexMap<usize, FreeList>,
    /// Retention bound per class.
    max_per_class: usize,
    stats: PoolStats,
}

impl SlotArrayPool {
    /// Create an empty pool retaining at most `max_per_class` arrays per class.
    pub fn new(max_per_class: usize) -> Self {
        Self {
            classes: IndexMap::new(),
            max_per_class,
            stats: PoolStats::default(),
        }
    }

    /// Rent an empty array with capacity of at least `min_capacity`.
    pub fn rent(&mut self, min_capacity: usize) -> Vec<Slot> {
        let class = class_for_request(min_capacity);
        self.stats.rents += 1;
        if let Some(array) = self.classes.get_mut(&class).and_then(|free| free.pop()) {
            self.stats.hits += 1;
            tracing::trace!(class, "slot array rented from pool");
            return array;
        }
        self.stats.allocations += 1;
        tracing::trace!(class, "slot array allocated");
        Vec::with_capacity(class)
    }

    /// Return an array to the pool.
    ///
    /// Callers drain the array first; any slots still in it are dropped
    /// without being released, so nothing a scope owned stays reachable
    /// from the pool. Arrays without capacity are ignored.
    pub fn give_back(&mut self, mut array: Vec<Slot>) {
        if array.capacity() == 0 {
            return;
        }
        debug_assert!(array.is_empty(), "slot array returned with live slots");
        array.clear();

        let class = class_for_capacity(array.capacity());
        let free = self.classes.entry(class).or_default();
        if free.len() >= self.max_per_class {
            self.stats.discarded += 1;
            return;
        }
        free.push(array);
        self.stats.returns += 1;
    }

    /// Number of arrays currently retained across all classes.
    pub fn retained(&self) -> usize {
        self.classes.values().map(|free| free.len()).sum()
    }

    /// Number of arrays retained in the class serving `min_capacity` requests.
    pub fn retained_for(&self, min_capacity: usize) -> usize {
        self.classes
            .get(&class_for_request(min_capacity))
            .map_or(0, |free| free.len())
    }

    /// Drop every retained array.
    pub fn clear(&mut self) {
        self.classes.clear();
    }

    /// Traffic counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

/// Smallest power-of-two class that satisfies a request.
fn class_for_request(min_capacity: usize) -> usize {
    min_capacity.max(1).next_power_of_two()
}

/// Largest power-of-two class an array of `capacity` can serve.
fn class_for_capacity(capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    1 << (usize::BITS - 1 - capacity.leading_zeros())
}
