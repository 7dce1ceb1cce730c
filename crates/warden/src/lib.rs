//! Warden: deterministic lifetime scopes for resource cleanup.
//!
//! A lifetime scope collects cleanup obligations while it is active and
//! releases all of them exactly once, last-registered first, when it ends.
//! Scopes nest, restart, hand out cancellation tokens, and are pooled so
//! that short-lived scopes cost almost nothing to create.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Warden sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use warden::prelude::*;
//!
//! struct Connection(Rc<RefCell<Vec<&'static str>>>);
//!
//! impl Disposable for Connection {
//!     fn dispose(&mut self) -> Result<(), ReleaseError> {
//!         self.0.borrow_mut().push("connection closed");
//!         Ok(())
//!     }
//! }
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut arena = ScopeArena::default();
//!
//! let session = arena.create();
//! let request = arena.create_child(session);
//! let token = arena.token(request);
//!
//! arena.add_disposable(session, Connection(Rc::clone(&log)));
//! let sink = Rc::clone(&log);
//! arena.add_cleanup(request, move || sink.borrow_mut().push("request done"));
//!
//! arena.terminate(session);
//! assert!(token.is_cancelled());
//! assert_eq!(*log.borrow(), vec!["request done", "connection closed"]);
//!
//! // Hand the instance back for reuse; the old handle is now stale.
//! arena.recycle(session).unwrap();
//! assert!(arena.is_terminated(session));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `warden-core` | Obligation traits, cancellation, ids, errors |
//! | [`arena`] | `warden-arena` | Scope arena, handles, pools, scoped commands |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Scope arena, handles, and pooling (`warden-arena`).
///
/// [`arena::ScopeArena`] owns every scope; [`arena::ScopeHandle`]s address
/// them. [`arena::ScopedCommand`] ties a repeatable action to a scope that
/// restarts on every run.
pub use warden_arena as arena;

/// Core traits and cancellation (`warden-core`).
///
/// Contains [`types::Disposable`], [`types::Lifetime`], and the
/// [`types::CancellationToken`] every scope hands out.
pub use warden_core as types;

/// Common imports for typical Warden usage.
///
/// ```rust
/// use warden::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use warden_arena::{
        ArenaConfig, ArenaError, ScopeArena, ScopeHandle, ScopeMut, ScopedCommand,
    };

    // Core traits
    pub use warden_core::{Disposable, Lifetime, ScopeAction};

    // Cancellation
    pub use warden_core::{CancellationToken, Cancelled};

    // Errors
    pub use warden_core::ReleaseError;
}
