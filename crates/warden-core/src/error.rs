//! Error types for cleanup obligations.

use std::any::Any;
use std::error::Error;
use std::fmt;

/// Failure reported by a single cleanup obligation during release.
///
/// Release failures never abort a termination pass: the scope logs the
/// error, counts it, and moves on to the next slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseError {
    /// A [`Disposable`](crate::Disposable) reported that it could not release.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The obligation panicked while running.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl ReleaseError {
    /// Shorthand for [`ReleaseError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Convert a panic payload captured by `catch_unwind` into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Self::Panicked { message }
    }
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "release failed: {reason}"),
            Self::Panicked { message } => write!(f, "release panicked: {message}"),
        }
    }
}

impl Error for ReleaseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_str() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(
            ReleaseError::from_panic(payload),
            ReleaseError::Panicked {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn panic_payload_string() {
        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(
            ReleaseError::from_panic(payload).to_string(),
            "release panicked: code 7"
        );
    }

    #[test]
    fn panic_payload_opaque() {
        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert!(matches!(
            ReleaseError::from_panic(payload),
            ReleaseError::Panicked { .. }
        ));
    }

    #[test]
    fn failed_display() {
        assert_eq!(
            ReleaseError::failed("socket busy").to_string(),
            "release failed: socket busy"
        );
    }
}
