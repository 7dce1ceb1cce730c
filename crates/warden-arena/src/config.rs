//! Arena configuration parameters.

use std::error::Error;
use std::fmt;

/// Configuration for a [`ScopeArena`](crate::ScopeArena).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Floor for overflow growth, in slots.
    ///
    /// When a scope's overflow array is full, the replacement is rented at
    /// `max(count, default_capacity) * 2` slots. Default: 2, which makes the
    /// first overflow rental hold 4 slots. Must be at least 1.
    pub default_capacity: usize,

    /// Maximum number of recycled scope instances kept for reuse.
    ///
    /// Recycled scopes beyond this bound are dropped. Default: 1000.
    pub max_pooled_scopes: usize,

    /// Maximum number of free backing arrays retained per size class.
    ///
    /// Default: 64. Must be at least 1.
    pub max_arrays_per_class: usize,
}

impl ArenaConfig {
    /// Default overflow growth floor.
    pub const DEFAULT_CAPACITY: usize = 2;

    /// Default scope pool bound.
    pub const DEFAULT_MAX_POOLED_SCOPES: usize = 1000;

    /// Default per-class backing array retention.
    pub const DEFAULT_MAX_ARRAYS_PER_CLASS: usize = 64;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_capacity == 0 {
            return Err(ConfigError::ZeroDefaultCapacity);
        }
        if self.max_arrays_per_class == 0 {
            return Err(ConfigError::ZeroClassRetention);
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            default_capacity: Self::DEFAULT_CAPACITY,
            max_pooled_scopes: Self::DEFAULT_MAX_POOLED_SCOPES,
            max_arrays_per_class: Self::DEFAULT_MAX_ARRAYS_PER_CLASS,
        }
    }
}

/// Errors detected during [`ArenaConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `default_capacity` is zero, so overflow growth would never start.
    ZeroDefaultCapacity,
    /// `max_arrays_per_class` is zero, so the backing pool could never reuse.
    ZeroClassRetention,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDefaultCapacity => write!(f, "default_capacity must be at least 1"),
            Self::ZeroClassRetention => write!(f, "max_arrays_per_class must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
