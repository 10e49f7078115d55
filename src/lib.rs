//! # Terminable
//!
//! > *"Close everything, lose nothing"*
//!
//! A Rust library for composable resource teardown.
//!
//! ## Philosophy
//!
//! Shutdown code usually stops at the first failure, leaking whatever was
//! registered after it and hiding every error but one. **Terminable** collects
//! resources in a [`CompositeTerminable`] as they are created and, at shutdown,
//! closes all of them:
//! - **Every resource is closed**, most recently registered first
//! - **Every failure is kept**, in order, inside one [`CompositeCloseError`]
//! - **Nothing is closed twice**, even with concurrent registration
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use terminable::prelude::*;
//!
//! let registry: CompositeTerminable = CompositeTerminable::new();
//!
//! let pool = registry.bind(Arc::new(from_fn(|| {
//!     println!("pool closed");
//!     Ok::<_, std::io::Error>(())
//! })));
//! registry.bind(Arc::new(from_fn(|| {
//!     Err::<(), _>(std::io::Error::other("listener already gone"))
//! })));
//!
//! // ... use `pool` ...
//! # let _ = pool;
//!
//! match registry.close_all() {
//!     Ok(()) => println!("clean shutdown"),
//!     Err(errors) => {
//!         assert_eq!(errors.len(), 1);
//!         println!("{}", errors);
//!     }
//! }
//! ```
//!
//! ## Feature flags
//!
//! - `tracing` - log drains, close failures and prunes through the
//!   [`tracing`](https://docs.rs/tracing) crate instead of stderr.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod consumer;
pub mod error;
pub mod handle;
pub mod module;
pub mod nonempty;
pub mod registry;
pub mod semigroup;
pub mod terminable;
pub mod testing;

// Re-exports
pub use consumer::{ConsumerExt, TerminableConsumer};
pub use error::{CompositeCloseError, NoCauses};
pub use handle::Handle;
pub use module::{ModuleCollection, TerminableModule};
pub use nonempty::NonEmptyVec;
pub use registry::CompositeTerminable;
pub use semigroup::Semigroup;
pub use terminable::{from_fn, BoxError, CloseFlag, ClosedCheck, FnTerminable, Reset, Terminable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::consumer::{ConsumerExt, TerminableConsumer};
    pub use crate::error::CompositeCloseError;
    pub use crate::module::{ModuleCollection, TerminableModule};
    pub use crate::registry::CompositeTerminable;
    pub use crate::semigroup::Semigroup;
    pub use crate::terminable::{from_fn, BoxError, CloseFlag, ClosedCheck, Reset, Terminable};
}
