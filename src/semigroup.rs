//! Semigroup trait for merging failure reports
//!
//! Closing a tree of registries produces one [`CompositeCloseError`] per
//! level. `Semigroup` is how those reports are merged without losing any
//! cause: combining is concatenation, and it must be associative.
//!
//! ```text
//! a.combine(b).combine(c) == a.combine(b.combine(c))
//! ```
//!
//! # Examples
//!
//! ```
//! use terminable::{CompositeCloseError, Semigroup};
//!
//! let first = CompositeCloseError::new(vec!["pool drained late"]);
//! let second = CompositeCloseError::new(vec!["socket reset"]);
//! let merged = first.combine(second);
//! assert_eq!(merged.into_causes().into_vec(), vec!["pool drained late", "socket reset"]);
//! ```
//!
//! [`CompositeCloseError`]: crate::CompositeCloseError

/// A type that supports an associative binary operation
///
/// `combine` takes `self` by value; clone first if the originals are still needed.
pub trait Semigroup: Sized {
    /// Combine this value with another value associatively
    fn combine(self, other: Self) -> Self;
}
