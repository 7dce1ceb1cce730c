//! Pooled lifetime scopes with generation-checked handles.
//!
//! A lifetime scope owns a growing set of cleanup obligations (disposable
//! resources, callbacks, kept-alive references, child scopes) and releases
//! all of them exactly once, in reverse registration order, when it ends.
//!
//! # Architecture
//!
//! ```text
//! ScopeArena (owner, single-threaded)
//! ├── Entry[] (generation + Box<LifetimeScope>, addressed by ScopeHandle)
//! │   └── LifetimeScope
//! │       ├── fast: Slot                (first obligation, inline)
//! │       ├── overflow: Vec<Slot>       (rented from SlotArrayPool)
//! │       └── cancellation: Option<CancellationSource> (lazy)
//! ├── pooled: Vec<Box<LifetimeScope>>   (bounded recycle free list)
//! ├── SlotArrayPool                     (power-of-two size classes)
//! └── root: ScopeHandle                 (terminated on arena drop)
//! ```
//!
//! # Lifecycle
//!
//! `create` → active → `terminate` → terminated → `restart` → active …
//! → `recycle` (handle goes stale, instance parked for the next `create`).
//!
//! Registering on a terminated or stale scope releases the obligation
//! immediately; nothing is ever silently dropped.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod backing;
pub mod command;
pub mod config;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod scope;
pub mod slot;

// Public re-exports for the primary API surface.
pub use arena::{ArenaStats, ScopeArena};
pub use backing::{PoolStats, SlotArrayPool};
pub use command::ScopedCommand;
pub use config::{ArenaConfig, ConfigError};
pub use cursor::ScopeMut;
pub use error::ArenaError;
pub use handle::ScopeHandle;
pub use scope::LifetimeScope;
pub use slot::{Slot, SlotKind};
