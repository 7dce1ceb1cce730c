//! Core types and traits for the Warden lifetime-scope framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions the scope engine is built on: scope identifiers,
//! release errors, the cleanup-obligation traits, and the cooperative
//! cancellation primitive a scope hands out to its consumers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod error;
pub mod id;
pub mod traits;

pub use cancel::{CancellationSource, CancellationToken, Cancelled};
pub use error::ReleaseError;
pub use id::ScopeId;
pub use traits::{BoundAction, Disposable, Lifetime, ScopeAction};
