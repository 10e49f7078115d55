//! Bundles of resource registrations.
//!
//! A [`TerminableModule`] knows how to register a group of resources with a
//! consumer. A [`ModuleCollection`] is itself a module that sets up its
//! members in order, so bundles compose.
//!
//! Any `Fn(&dyn TerminableConsumer<E>)` closure is a module.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use terminable::prelude::*;
//!
//! let cache = |c: &dyn TerminableConsumer| {
//!     c.bind(Arc::new(from_fn(|| Ok::<_, std::io::Error>(()))));
//! };
//! let metrics = |c: &dyn TerminableConsumer| {
//!     c.bind(Arc::new(from_fn(|| Ok::<_, std::io::Error>(()))));
//! };
//!
//! let services = ModuleCollection::new()
//!     .with_module(cache)
//!     .with_module(metrics);
//!
//! let registry: CompositeTerminable = CompositeTerminable::new();
//! registry.bind_module(services);
//! assert_eq!(registry.len(), 2);
//! ```

use std::fmt;

use crate::consumer::TerminableConsumer;
use crate::terminable::BoxError;

/// A deferred batch of registrations.
pub trait TerminableModule<E = BoxError> {
    /// Register this module's resources with `consumer`.
    fn setup(&self, consumer: &dyn TerminableConsumer<E>);

    /// Register this module's resources with `consumer`.
    ///
    /// Same as [`TerminableConsumer::bind_module`], from the module's side.
    fn bind_module_with(&self, consumer: &dyn TerminableConsumer<E>) {
        self.setup(consumer);
    }
}

impl<E, F> TerminableModule<E> for F
where
    F: Fn(&dyn TerminableConsumer<E>),
{
    fn setup(&self, consumer: &dyn TerminableConsumer<E>) {
        self(consumer)
    }
}

/// An ordered list of modules, set up one after another.
pub struct ModuleCollection<E = BoxError> {
    modules: Vec<Box<dyn TerminableModule<E>>>,
}

impl<E> ModuleCollection<E> {
    /// An empty collection.
    pub fn new() -> Self {
        ModuleCollection {
            modules: Vec::new(),
        }
    }

    /// A collection of already boxed modules, kept in the given order.
    pub fn from_modules(modules: Vec<Box<dyn TerminableModule<E>>>) -> Self {
        ModuleCollection { modules }
    }

    /// Append a module.
    pub fn push<M>(&mut self, module: M)
    where
        M: TerminableModule<E> + 'static,
    {
        self.modules.push(Box::new(module));
    }

    /// Append a module, builder style.
    pub fn with_module<M>(mut self, module: M) -> Self
    where
        M: TerminableModule<E> + 'static,
    {
        self.push(module);
        self
    }

    /// The members, in setup order.
    pub fn modules(&self) -> &[Box<dyn TerminableModule<E>>] {
        &self.modules
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the collection has no members.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<E> Default for ModuleCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ModuleCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCollection")
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl<E> TerminableModule<E> for ModuleCollection<E> {
    fn setup(&self, consumer: &dyn TerminableConsumer<E>) {
        for module in &self.modules {
            module.bind_module_with(consumer);
        }
    }
}
