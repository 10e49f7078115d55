//! The "accept and own a resource" capability.
//!
//! [`TerminableConsumer`] is object safe so that modules can register
//! resources against any consumer through `&dyn TerminableConsumer<E>`.
//! The typed, chaining form lives on [`ConsumerExt::bind`], which is
//! implemented for every consumer, sized or not.

use std::sync::Arc;

use crate::handle::Handle;
use crate::module::TerminableModule;
use crate::terminable::{BoxError, Terminable};

/// Something that takes ownership of resources until it closes them.
pub trait TerminableConsumer<E = BoxError> {
    /// Take ownership of a type-erased resource.
    fn accept(&self, handle: Handle<E>);

    /// Let `module` register its resources with this consumer, then return it.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use terminable::prelude::*;
    ///
    /// struct Sockets;
    ///
    /// impl TerminableModule for Sockets {
    ///     fn setup(&self, consumer: &dyn TerminableConsumer) {
    ///         consumer.bind(Arc::new(from_fn(|| Ok::<_, std::io::Error>(()))));
    ///         consumer.bind(Arc::new(from_fn(|| Ok::<_, std::io::Error>(()))));
    ///     }
    /// }
    ///
    /// let registry: CompositeTerminable = CompositeTerminable::new();
    /// let _sockets = registry.bind_module(Sockets);
    /// assert_eq!(registry.len(), 2);
    /// ```
    fn bind_module<M>(&self, module: M) -> M
    where
        Self: Sized,
        M: TerminableModule<E>,
    {
        module.setup(self);
        module
    }
}

/// Typed registration for every [`TerminableConsumer`].
pub trait ConsumerExt<E>: TerminableConsumer<E> {
    /// Register `resource` and return it, so calls can be chained at the
    /// point where the resource is created.
    fn bind<T>(&self, resource: Arc<T>) -> Arc<T>
    where
        T: Terminable + ?Sized + 'static,
        T::Error: Into<E>,
    {
        self.accept(Handle::new(Arc::clone(&resource)));
        resource
    }
}

impl<E, C> ConsumerExt<E> for C where C: TerminableConsumer<E> + ?Sized {}
