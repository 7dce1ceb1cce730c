//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from handle-addressed arena operations.
///
/// Registration and termination never fail: a stale handle simply denotes a
/// scope that has already ended. Only operations that would bring a scope
/// back to life, or hand it back to the pool, need the handle to be current.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// A `ScopeHandle` whose scope has been recycled (or never existed).
    StaleHandle {
        /// Slot index encoded in the handle.
        index: u32,
        /// The generation encoded in the handle.
        handle_generation: u32,
        /// The slot's current generation, if the index exists.
        current_generation: Option<u32>,
    },
    /// The arena's root scope cannot be recycled.
    RootScope,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle {
                index,
                handle_generation,
                current_generation: Some(current),
            } => write!(
                f,
                "stale scope handle: index {index}, generation {handle_generation}, current {current}"
            ),
            Self::StaleHandle {
                index,
                handle_generation,
                current_generation: None,
            } => write!(
                f,
                "unknown scope handle: index {index}, generation {handle_generation}"
            ),
            Self::RootScope => write!(f, "the root scope cannot be recycled"),
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_stale() {
        let err = ArenaError::StaleHandle {
            index: 3,
            handle_generation: 1,
            current_generation: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "stale scope handle: index 3, generation 1, current 2"
        );
    }

    #[test]
    fn display_unknown() {
        let err = ArenaError::StaleHandle {
            index: 9,
            handle_generation: 0,
            current_generation: None,
        };
        assert!(err.to_string().starts_with("unknown scope handle"));
    }
}
