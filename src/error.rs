//! Error types for close passes.
//!
//! A drain never stops at the first failure. Every failure it meets is kept,
//! in the order it happened, and handed back as one [`CompositeCloseError`].
//!
//! # Examples
//!
//! ```rust
//! use terminable::CompositeCloseError;
//!
//! let err = CompositeCloseError::new(vec!["pool busy", "socket reset"]);
//! assert_eq!(err.len(), 2);
//! assert_eq!(
//!     err.to_string(),
//!     "2 error(s) occurred while closing: [pool busy, socket reset]"
//! );
//!
//! // A pass that caught nothing has nothing to report.
//! assert!(CompositeCloseError::<&str>::try_new(Vec::new()).is_err());
//! ```

use std::fmt;

use crate::{NonEmptyVec, Semigroup};

/// Failures captured while closing the resources of a registry.
///
/// Holds at least one cause; causes are ordered as they were encountered.
///
/// Consume it in one of three ways:
/// - propagate it from [`close_all`](crate::CompositeTerminable::close_all)
/// - take it as an `Option` from [`close_silently`](crate::CompositeTerminable::close_silently)
/// - let [`close_unchecked`](crate::CompositeTerminable::close_unchecked) report and drop it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCloseError<E> {
    causes: NonEmptyVec<E>,
}

impl<E> CompositeCloseError<E> {
    /// Build an error from the failures of one close pass.
    ///
    /// Returns [`NoCauses`] if `causes` is empty.
    pub fn try_new(causes: Vec<E>) -> Result<Self, NoCauses> {
        NonEmptyVec::from_vec(causes)
            .map(Self::from_causes)
            .ok_or(NoCauses)
    }

    /// Build an error from the failures of one close pass.
    ///
    /// # Panics
    ///
    /// Panics if `causes` is empty. Building an error for a pass that caught
    /// nothing is a bug in the caller.
    ///
    /// ```should_panic
    /// use terminable::CompositeCloseError;
    ///
    /// let _ = CompositeCloseError::<String>::new(Vec::new());
    /// ```
    pub fn new(causes: Vec<E>) -> Self {
        match Self::try_new(causes) {
            Ok(err) => err,
            Err(invalid) => panic!("{}", invalid),
        }
    }

    /// Build an error from a cause list that is already known to be non-empty.
    pub fn from_causes(causes: NonEmptyVec<E>) -> Self {
        CompositeCloseError { causes }
    }

    /// The captured failures, in capture order.
    pub fn causes(&self) -> &NonEmptyVec<E> {
        &self.causes
    }

    /// Iterate over the captured failures.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.causes.iter()
    }

    /// Number of captured failures, always at least 1.
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Take ownership of the captured failures.
    pub fn into_causes(self) -> NonEmptyVec<E> {
        self.causes
    }

    /// `Ok(())` for a pass that caught nothing, otherwise the aggregate.
    pub(crate) fn check(caught: Vec<E>) -> Result<(), Self> {
        match NonEmptyVec::from_vec(caught) {
            None => Ok(()),
            Some(causes) => Err(Self::from_causes(causes)),
        }
    }
}

impl<E> CompositeCloseError<CompositeCloseError<E>> {
    /// Merge the failures of nested registries into one list.
    ///
    /// A registry whose resources are themselves registries reports one
    /// aggregate per failing child. Flattening concatenates their causes in
    /// the order the children were closed.
    ///
    /// # Example
    ///
    /// ```
    /// use terminable::CompositeCloseError;
    ///
    /// let nested = CompositeCloseError::new(vec![
    ///     CompositeCloseError::new(vec!["cache"]),
    ///     CompositeCloseError::new(vec!["db", "queue"]),
    /// ]);
    /// let flat = nested.flatten();
    /// assert_eq!(flat.into_causes().into_vec(), vec!["cache", "db", "queue"]);
    /// ```
    pub fn flatten(self) -> CompositeCloseError<E> {
        self.causes.reduce()
    }
}

impl<E: fmt::Debug> CompositeCloseError<E> {
    /// Render the error followed by the debug trace of each cause.
    ///
    /// # Example
    ///
    /// ```
    /// use terminable::CompositeCloseError;
    ///
    /// let err = CompositeCloseError::new(vec!["E1", "E2"]);
    /// let text = err.diagnostic();
    /// let lines: Vec<&str> = text.lines().collect();
    /// assert_eq!(lines[1], "  [1/2] \"E1\"");
    /// assert_eq!(lines[2], "  [2/2] \"E2\"");
    /// ```
    pub fn diagnostic(&self) -> String
    where
        E: fmt::Display,
    {
        let total = self.len();
        let mut out = self.to_string();
        for (i, cause) in self.iter().enumerate() {
            out.push_str(&format!("\n  [{}/{}] {:?}", i + 1, total, cause));
        }
        out
    }

    /// Report the error and every cause through the diagnostics channel.
    ///
    /// With the `tracing` feature each line is an `ERROR` event; otherwise the
    /// rendering from [`diagnostic`](Self::diagnostic) is written to stderr.
    pub fn report_all(&self)
    where
        E: fmt::Display,
    {
        #[cfg(feature = "tracing")]
        {
            let total = self.len();
            tracing::error!("{}", self);
            for (i, cause) in self.iter().enumerate() {
                tracing::error!(index = i + 1, total, "{:?}", cause);
            }
        }
        #[cfg(not(feature = "tracing"))]
        eprintln!("{}", self.diagnostic());
    }
}

impl<E> Semigroup for CompositeCloseError<E> {
    fn combine(self, other: Self) -> Self {
        CompositeCloseError {
            causes: self.causes.combine(other.causes),
        }
    }
}

impl<E> IntoIterator for CompositeCloseError<E> {
    type Item = E;
    type IntoIter = <NonEmptyVec<E> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.causes.into_iter()
    }
}

impl<E: fmt::Display> fmt::Display for CompositeCloseError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred while closing: [", self.len())?;
        for (i, cause) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", cause)?;
        }
        f.write_str("]")
    }
}

// Causes are exposed through `causes()`; `source()` stays `None` so that
// boxed causes, which are not themselves `Error`, are supported.
impl<E: fmt::Debug + fmt::Display> std::error::Error for CompositeCloseError<E> {}

/// Returned when a [`CompositeCloseError`] is built from an empty cause list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoCauses;

impl fmt::Display for NoCauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid state: composite close error requires at least one cause")
    }
}

impl std::error::Error for NoCauses {}

/// Emit one diagnostic line for a failure nobody will handle.
pub(crate) fn report(message: &str) {
    #[cfg(feature = "tracing")]
    tracing::error!("{}", message);
    #[cfg(not(feature = "tracing"))]
    eprintln!("{}", message);
}
