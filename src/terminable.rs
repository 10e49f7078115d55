//! Capabilities a resource can expose to a registry
//!
//! Every resource is [`Terminable`]: it has a blocking, fallible `close`.
//! Two further capabilities are optional and discovered through explicit
//! queries rather than type inspection:
//!
//! - [`ClosedCheck`] - the resource can tell whether it is already closed
//! - [`Reset`] - the resource has a hook to run before that check
//!
//! A resource opts in by returning `Some(self)` (or an embedded field) from
//! [`Terminable::as_closed_check`] / [`Terminable::as_reset`].
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use terminable::{CloseFlag, ClosedCheck, Terminable};
//!
//! #[derive(Debug, Default)]
//! struct Connection {
//!     closed: CloseFlag,
//! }
//!
//! impl Terminable for Connection {
//!     type Error = Infallible;
//!
//!     fn close(&self) -> Result<(), Infallible> {
//!         self.closed.mark_closed();
//!         Ok(())
//!     }
//!
//!     fn as_closed_check(&self) -> Option<&dyn ClosedCheck> {
//!         Some(&self.closed)
//!     }
//! }
//!
//! let conn = Connection::default();
//! conn.close().unwrap();
//! assert!(conn.as_closed_check().unwrap().is_closed());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::consumer::{ConsumerExt, TerminableConsumer};
use crate::error::report;

/// Boxed error used as the default cause type of a registry.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A resource with a blocking, fallible release operation.
///
/// `close` takes `&self` because a registered resource is shared between the
/// registry and whoever registered it. Implementations that must not release
/// twice should guard themselves, for example with a [`CloseFlag`].
pub trait Terminable: Send + Sync {
    /// Error produced when the resource cannot be released.
    type Error;

    /// Release the resource.
    fn close(&self) -> Result<(), Self::Error>;

    /// The closed-check capability, if this resource has one.
    ///
    /// Defaults to `None`: the registry then treats the resource's state as
    /// unknown and never prunes it during [`reset`](crate::CompositeTerminable::reset).
    fn as_closed_check(&self) -> Option<&dyn ClosedCheck> {
        None
    }

    /// The reset capability, if this resource has one.
    fn as_reset(&self) -> Option<&dyn Reset> {
        None
    }

    /// Close and hand back the failure instead of propagating it.
    ///
    /// # Example
    ///
    /// ```
    /// use terminable::{from_fn, Terminable};
    ///
    /// let broken = from_fn(|| Err::<(), _>("busy"));
    /// assert_eq!(broken.close_silently(), Some("busy"));
    /// ```
    fn close_silently(&self) -> Option<Self::Error> {
        self.close().err()
    }

    /// Close and report any failure through the diagnostics channel.
    ///
    /// With the `tracing` feature the failure is logged at `ERROR`; without it
    /// the failure goes to stderr. Use this only where nothing can recover.
    fn close_unchecked(&self)
    where
        Self: Sized,
        Self::Error: fmt::Debug,
    {
        if let Some(err) = self.close_silently() {
            report(&format!("{:?}", err));
        }
    }

    /// Register this resource with `consumer`.
    fn bind_with<E>(self: Arc<Self>, consumer: &dyn TerminableConsumer<E>)
    where
        Self: Sized + 'static,
        Self::Error: Into<E>,
    {
        consumer.bind(self);
    }
}

/// Reports whether a resource has reached its terminal state.
pub trait ClosedCheck {
    /// `true` once the resource is closed.
    fn is_closed(&self) -> bool;
}

/// A hook with no result, run by [`CompositeTerminable::reset`](crate::CompositeTerminable::reset)
/// before the closed check.
pub trait Reset {
    /// Run the hook.
    fn reset(&self);
}

/// A latch recording that a resource has been closed.
///
/// Resource authors embed it to get a [`ClosedCheck`] and an idempotent close.
///
/// # Example
///
/// ```
/// use terminable::{CloseFlag, ClosedCheck};
///
/// let flag = CloseFlag::new();
/// assert!(flag.mark_closed());
/// assert!(!flag.mark_closed()); // already closed
/// assert!(flag.is_closed());
/// ```
#[derive(Debug, Default)]
pub struct CloseFlag {
    closed: AtomicBool,
}

impl CloseFlag {
    /// A flag in the open state.
    pub const fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
        }
    }

    /// Mark closed. Returns `true` only for the call that performed the transition.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Whether the flag has been marked.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ClosedCheck for CloseFlag {
    fn is_closed(&self) -> bool {
        CloseFlag::is_closed(self)
    }
}

/// A resource whose release is a closure.
///
/// Created by [`from_fn`].
pub struct FnTerminable<F> {
    close: F,
}

impl<F> fmt::Debug for FnTerminable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTerminable")
            .field("close", &"<function>")
            .finish()
    }
}

impl<F, E> Terminable for FnTerminable<F>
where
    F: Fn() -> Result<(), E> + Send + Sync,
{
    type Error = E;

    fn close(&self) -> Result<(), E> {
        (self.close)()
    }
}

/// Turn a closure into a [`Terminable`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use terminable::{from_fn, BoxError, CompositeTerminable};
///
/// let registry = CompositeTerminable::<BoxError>::new();
/// registry.bind(Arc::new(from_fn(|| {
///     println!("flushing");
///     Ok::<_, std::io::Error>(())
/// })));
/// assert!(registry.close_all().is_ok());
/// ```
pub fn from_fn<F, E>(close: F) -> FnTerminable<F>
where
    F: Fn() -> Result<(), E> + Send + Sync,
{
    FnTerminable { close }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_close_flag_transitions_once() {
        let flag = CloseFlag::new();
        assert!(!flag.is_closed());
        assert!(flag.mark_closed());
        assert!(!flag.mark_closed());
        assert!(flag.is_closed());
    }

    #[test]
    fn test_from_fn_runs_closure_each_close() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resource = from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });

        resource.close().unwrap();
        resource.close().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_capabilities_are_absent() {
        let resource = from_fn(|| Ok::<_, String>(()));
        assert!(resource.as_closed_check().is_none());
        assert!(resource.as_reset().is_none());
    }

    #[test]
    fn test_close_silently_captures_error() {
        let ok = from_fn(|| Ok::<_, &str>(()));
        let broken = from_fn(|| Err::<(), _>("E1"));
        assert_eq!(ok.close_silently(), None);
        assert_eq!(broken.close_silently(), Some("E1"));
    }

    #[test]
    fn test_close_unchecked_swallows_error() {
        let broken = from_fn(|| Err::<(), _>("boom"));
        broken.close_unchecked();
    }
}
