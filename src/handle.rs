//! Type-erased registry entries.
//!
//! A registry holds resources of many types whose errors all convert into a
//! single cause type `E`. [`Handle`] erases the resource type while keeping the
//! address of the original `Arc` allocation, which is the identity used by
//! [`close_specific`](crate::CompositeTerminable::close_specific).

use std::fmt;
use std::sync::Arc;

use crate::terminable::{ClosedCheck, Reset, Terminable};

trait Erased<E>: Send + Sync {
    fn close(&self) -> Result<(), E>;
    fn closed_check(&self) -> Option<&dyn ClosedCheck>;
    fn reset_hook(&self) -> Option<&dyn Reset>;
}

struct Shared<T: ?Sized>(Arc<T>);

impl<T, E> Erased<E> for Shared<T>
where
    T: Terminable + ?Sized,
    T::Error: Into<E>,
{
    fn close(&self) -> Result<(), E> {
        self.0.close().map_err(Into::into)
    }

    fn closed_check(&self) -> Option<&dyn ClosedCheck> {
        self.0.as_closed_check()
    }

    fn reset_hook(&self) -> Option<&dyn Reset> {
        self.0.as_reset()
    }
}

fn address_of<T: ?Sized>(resource: &Arc<T>) -> usize {
    Arc::as_ptr(resource).cast::<()>() as usize
}

/// One resource owned by a registry, with its error type converted to `E`.
///
/// Closing consumes the handle, so a handle can be closed at most once.
pub struct Handle<E> {
    address: usize,
    type_name: &'static str,
    resource: Arc<dyn Erased<E>>,
}

impl<E> Handle<E> {
    /// Wrap a shared resource.
    pub fn new<T>(resource: Arc<T>) -> Self
    where
        T: Terminable + ?Sized + 'static,
        T::Error: Into<E>,
    {
        Handle {
            address: address_of(&resource),
            type_name: std::any::type_name::<T>(),
            resource: Arc::new(Shared(resource)),
        }
    }

    /// Whether this handle wraps the same allocation as `resource`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use terminable::{from_fn, Handle};
    ///
    /// let a = Arc::new(from_fn(|| Ok::<_, String>(())));
    /// let b = Arc::new(from_fn(|| Ok::<_, String>(())));
    /// let handle = Handle::<String>::new(Arc::clone(&a));
    /// assert!(handle.is(&a));
    /// assert!(!handle.is(&b));
    /// ```
    pub fn is<T: ?Sized>(&self, resource: &Arc<T>) -> bool {
        self.address == address_of(resource)
    }

    /// Type name of the wrapped resource, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A second handle to the same resource, used to inspect it without the
    /// registry lock held. Never closed.
    pub(crate) fn share(&self) -> Self {
        Handle {
            address: self.address,
            type_name: self.type_name,
            resource: Arc::clone(&self.resource),
        }
    }

    pub(crate) fn address(&self) -> usize {
        self.address
    }

    /// Release the resource.
    pub fn close(self) -> Result<(), E> {
        self.resource.close()
    }

    /// Run the reset hook (if any) and report whether the resource can be dropped
    /// from bookkeeping. Resources without a closed check are never spent.
    pub(crate) fn is_spent(&self) -> bool {
        let Some(check) = self.resource.closed_check() else {
            return false;
        };
        if let Some(hook) = self.resource.reset_hook() {
            hook.reset();
        }
        check.is_closed()
    }
}

impl<T, E> From<Arc<T>> for Handle<E>
where
    T: Terminable + ?Sized + 'static,
    T::Error: Into<E>,
{
    fn from(resource: Arc<T>) -> Self {
        Handle::new(resource)
    }
}

impl<E> fmt::Debug for Handle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type_name", &self.type_name)
            .field("address", &format_args!("{:#x}", self.address))
            .finish()
    }
}
