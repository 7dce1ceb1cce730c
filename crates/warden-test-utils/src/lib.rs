//! Test utilities and mock obligations for Warden development.
//!
//! Provides a [`ReleaseLog`] that records the order in which cleanup
//! obligations run, mock [`Disposable`](warden_core::Disposable) implementations (well-behaved,
//! failing, and panicking), and a one-shot tracing subscriber for tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{MockDisposable, ReleaseLog};

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging at `TRACE` level.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level. The first call wins.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}
