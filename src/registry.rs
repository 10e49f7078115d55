//! The composite registry.
//!
//! [`CompositeTerminable`] owns resources until it closes them. Resources are
//! kept most-recent-first, so [`close_all`](CompositeTerminable::close_all)
//! releases them in reverse order of registration: something registered after
//! its dependencies is closed before them.
//!
//! # Concurrency
//!
//! The pending set sits behind a `parking_lot::Mutex`. Each resource leaves
//! the set under the lock, so exactly one close path ever receives it. The
//! lock is released before `close` runs, which means a resource may register
//! or close other resources from inside its own `close`. Resources added while
//! a drain is running may or may not be picked up by that drain, but they are
//! never closed twice.
//!
//! [`reset`](CompositeTerminable::reset) likewise runs reset hooks and closed
//! checks against a snapshot, with the lock released, and only re-locks to
//! drop the entries found closed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use terminable::prelude::*;
//!
//! let registry: CompositeTerminable = CompositeTerminable::new();
//! let db = registry.bind(Arc::new(from_fn(|| Ok::<_, std::io::Error>(()))));
//! registry.add(Arc::new(from_fn(|| {
//!     Err::<(), _>(std::io::Error::other("flush failed"))
//! })));
//!
//! // `db` is still usable here; the registry closes it at shutdown.
//! let _ = &db;
//!
//! let err = registry.close_all().unwrap_err();
//! assert_eq!(err.len(), 1);
//! assert!(registry.is_empty());
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::consumer::TerminableConsumer;
use crate::error::CompositeCloseError;
use crate::handle::Handle;
use crate::terminable::{BoxError, ClosedCheck, Reset, Terminable};

/// A thread-safe collection of resources closed together.
///
/// `E` is the type every resource error converts into. The default,
/// [`BoxError`], accepts any `std::error::Error + Send + Sync`.
///
/// Resources are matched by identity: two `Arc`s refer to the same resource
/// only if they share an allocation.
pub struct CompositeTerminable<E = BoxError> {
    pending: Mutex<VecDeque<Handle<E>>>,
}

impl<E> CompositeTerminable<E> {
    /// An empty registry.
    pub fn new() -> Self {
        CompositeTerminable {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of resources waiting to be closed.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether nothing is waiting to be closed.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Register a resource and return the registry for chaining.
    pub fn add<T>(&self, resource: Arc<T>) -> &Self
    where
        T: Terminable + ?Sized + 'static,
        T::Error: Into<E>,
    {
        self.push(Handle::new(resource));
        self
    }

    /// Register a resource and return it.
    pub fn bind<T>(&self, resource: Arc<T>) -> Arc<T>
    where
        T: Terminable + ?Sized + 'static,
        T::Error: Into<E>,
    {
        self.push(Handle::new(Arc::clone(&resource)));
        resource
    }

    /// Register each resource in iteration order.
    ///
    /// Accepts anything convertible into a [`Handle`]: `Arc<T>` for a single
    /// resource type, or handles built with [`Handle::new`] to mix types.
    pub fn add_all<I>(&self, resources: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Handle<E>>,
    {
        for resource in resources {
            self.push(resource.into());
        }
        self
    }

    fn push(&self, handle: Handle<E>) {
        self.pending.lock().push_front(handle);
    }

    fn take_head(&self) -> Option<Handle<E>> {
        self.pending.lock().pop_front()
    }

    /// Close every pending resource, most recently registered first.
    ///
    /// A failing resource does not stop the drain. When the drain finishes,
    /// every failure is returned together, in the order it occurred.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use terminable::{from_fn, CompositeTerminable};
    ///
    /// let registry = CompositeTerminable::<String>::new();
    /// registry
    ///     .add(Arc::new(from_fn(|| Err::<(), _>("E1".to_string()))))
    ///     .add(Arc::new(from_fn(|| Ok::<_, String>(()))));
    ///
    /// let err = registry.close_all().unwrap_err();
    /// assert_eq!(err.causes().head(), "E1");
    /// ```
    pub fn close_all(&self) -> Result<(), CompositeCloseError<E>> {
        let mut caught = Vec::new();

        #[cfg(feature = "tracing")]
        let mut attempted = 0usize;
        #[cfg(feature = "tracing")]
        tracing::debug!(pending = self.len(), "closing all resources");

        while let Some(handle) = self.take_head() {
            #[cfg(feature = "tracing")]
            let type_name = handle.type_name();
            #[cfg(feature = "tracing")]
            {
                attempted += 1;
                tracing::trace!(resource = type_name, "closing resource");
            }

            if let Err(err) = handle.close() {
                #[cfg(feature = "tracing")]
                tracing::warn!(resource = type_name, "resource failed to close");
                caught.push(err);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(attempted, failed = caught.len(), "close pass finished");

        CompositeCloseError::check(caught)
    }

    /// Close every pending resource and hand back the failures, if any.
    pub fn close_silently(&self) -> Option<CompositeCloseError<E>> {
        self.close_all().err()
    }

    /// Close every pending resource and report the failures, if any, through
    /// [`CompositeCloseError::report_all`].
    pub fn close_unchecked(&self)
    where
        E: fmt::Debug + fmt::Display,
    {
        if let Some(err) = self.close_silently() {
            err.report_all();
        }
    }

    /// Remove and close `resource`.
    ///
    /// Every pending entry sharing `resource`'s allocation is removed and
    /// closed, in registry order. Other resources are untouched. A resource
    /// that is not registered is ignored.
    pub fn close_specific<T>(&self, resource: &Arc<T>) -> Result<(), CompositeCloseError<E>>
    where
        T: ?Sized,
    {
        let matched: Vec<Handle<E>> = {
            let mut pending = self.pending.lock();
            let (matched, kept): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|handle| handle.is(resource));
            *pending = kept;
            matched.into_iter().collect()
        };

        let caught: Vec<E> = matched
            .into_iter()
            .filter_map(|handle| handle.close().err())
            .collect();
        CompositeCloseError::check(caught)
    }

    /// Forget resources that were closed by some other path.
    ///
    /// For each resource exposing a [`ClosedCheck`], its [`Reset`] hook (if
    /// any) runs first, then the resource is dropped from the registry if it
    /// reports itself closed. Resources without a closed check, and resources
    /// still open, stay. Nothing is closed here.
    ///
    /// Hooks run without the registry lock held, so they may register
    /// resources with this registry. Those are kept.
    pub fn reset(&self) {
        let snapshot: Vec<Handle<E>> = self.pending.lock().iter().map(Handle::share).collect();
        let spent: HashSet<usize> = snapshot
            .iter()
            .filter(|handle| handle.is_spent())
            .map(Handle::address)
            .collect();
        drop(snapshot);

        if spent.is_empty() {
            return;
        }

        let mut pending = self.pending.lock();
        #[cfg(feature = "tracing")]
        let before = pending.len();

        pending.retain(|handle| !spent.contains(&handle.address()));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            pruned = before - pending.len(),
            remaining = pending.len(),
            "pruned closed resources"
        );
    }
}

impl<E> Default for CompositeTerminable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for CompositeTerminable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTerminable")
            .field("pending", &self.len())
            .finish()
    }
}

impl<E> TerminableConsumer<E> for CompositeTerminable<E> {
    fn accept(&self, handle: Handle<E>) {
        self.push(handle);
    }
}

impl<E> Terminable for CompositeTerminable<E> {
    type Error = CompositeCloseError<E>;

    fn close(&self) -> Result<(), Self::Error> {
        self.close_all()
    }

    fn as_closed_check(&self) -> Option<&dyn ClosedCheck> {
        Some(self)
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

// A registry accepts new resources after a drain, so it never reports closed.
// It still exposes the check so that a parent's reset reaches its hook.
impl<E> ClosedCheck for CompositeTerminable<E> {
    fn is_closed(&self) -> bool {
        false
    }
}

impl<E> Reset for CompositeTerminable<E> {
    fn reset(&self) {
        CompositeTerminable::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminable::{from_fn, CloseFlag};
    use parking_lot::Mutex as PlMutex;

    fn recording(
        log: &Arc<PlMutex<Vec<&'static str>>>,
        name: &'static str,
    ) -> Arc<impl Terminable<Error = String>> {
        let log = Arc::clone(log);
        Arc::new(from_fn(move || {
            log.lock().push(name);
            Ok::<_, String>(())
        }))
    }

    #[test]
    fn test_close_all_is_lifo() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        registry
            .add(recording(&log, "a"))
            .add(recording(&log, "b"))
            .add(recording(&log, "c"));

        assert!(registry.close_all().is_ok());
        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_all_on_empty_registry() {
        let registry = CompositeTerminable::<String>::new();
        assert!(registry.close_all().is_ok());
        assert!(registry.close_silently().is_none());
    }

    #[test]
    fn test_failures_do_not_stop_drain() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        registry.add(recording(&log, "first"));
        registry.add(Arc::new(from_fn(|| Err::<(), _>("E1".to_string()))));
        registry.add(Arc::new(from_fn(|| Err::<(), _>("E2".to_string()))));

        let err = registry.close_all().unwrap_err();
        assert_eq!(err.into_causes().into_vec(), vec!["E2", "E1"]);
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[test]
    fn test_second_close_all_is_noop() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        registry.add(recording(&log, "once"));

        registry.close_all().unwrap();
        registry.close_all().unwrap();
        assert_eq!(*log.lock(), vec!["once"]);
    }

    #[test]
    fn test_close_specific_only_touches_match() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        let a = registry.bind(recording(&log, "a"));
        let b = registry.bind(recording(&log, "b"));

        registry.close_specific(&a).unwrap();
        assert_eq!(*log.lock(), vec!["a"]);
        assert_eq!(registry.len(), 1);

        registry.close_specific(&a).unwrap();
        assert_eq!(*log.lock(), vec!["a"]);

        registry.close_all().unwrap();
        assert_eq!(*log.lock(), vec!["a", "b"]);
        drop(b);
    }

    #[test]
    fn test_close_specific_removes_every_registration() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        let twice = recording(&log, "twice");
        registry.add(Arc::clone(&twice)).add(Arc::clone(&twice));

        registry.close_specific(&twice).unwrap();
        assert_eq!(*log.lock(), vec!["twice", "twice"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_specific_keeps_remaining_order() {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let registry = CompositeTerminable::<String>::new();
        let target = recording(&log, "target");
        registry
            .add(recording(&log, "a"))
            .add(Arc::clone(&target))
            .add(recording(&log, "b"))
            .add(Arc::clone(&target))
            .add(recording(&log, "c"));

        registry.close_specific(&target).unwrap();
        assert_eq!(registry.len(), 3);

        registry.close_all().unwrap();
        assert_eq!(*log.lock(), vec!["target", "target", "c", "b", "a"]);
    }

    #[test]
    fn test_close_specific_aggregates_failure() {
        let registry = CompositeTerminable::<String>::new();
        let broken = registry.bind(Arc::new(from_fn(|| Err::<(), _>("bad".to_string()))));
        let err = registry.close_specific(&broken).unwrap_err();
        assert_eq!(err.causes().head(), "bad");
    }

    #[test]
    fn test_close_specific_unknown_resource() {
        let registry = CompositeTerminable::<String>::new();
        registry.add(Arc::new(from_fn(|| Ok::<_, String>(()))));
        let stranger = Arc::new(from_fn(|| Err::<(), String>("never".into())));
        assert!(registry.close_specific(&stranger).is_ok());
        assert_eq!(registry.len(), 1);
    }

    struct Flagged(CloseFlag);

    impl Terminable for Flagged {
        type Error = String;

        fn close(&self) -> Result<(), String> {
            self.0.mark_closed();
            Ok(())
        }

        fn as_closed_check(&self) -> Option<&dyn ClosedCheck> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_reset_prunes_only_closed() {
        let registry = CompositeTerminable::<String>::new();
        let done = registry.bind(Arc::new(Flagged(CloseFlag::new())));
        let open = registry.bind(Arc::new(Flagged(CloseFlag::new())));
        registry.add(Arc::new(from_fn(|| Ok::<_, String>(()))));

        done.close().unwrap();
        registry.reset();

        assert_eq!(registry.len(), 2);
        assert!(!open.0.is_closed());
    }

    #[test]
    fn test_nested_registry_propagates_reset_and_errors() {
        let parent = CompositeTerminable::<CompositeCloseError<String>>::new();
        let child = parent.bind(Arc::new(CompositeTerminable::<String>::new()));
        let spent = child.bind(Arc::new(Flagged(CloseFlag::new())));
        child.add(Arc::new(from_fn(|| Err::<(), _>("child failed".to_string()))));

        spent.close().unwrap();
        parent.reset();
        assert_eq!(child.len(), 1);
        assert_eq!(parent.len(), 1);

        let err = parent.close_all().unwrap_err();
        assert_eq!(err.causes().head().causes().head(), "child failed");
        assert_eq!(err.flatten().into_causes().into_vec(), vec!["child failed"]);
    }

    #[test]
    fn test_debug_shows_pending_count() {
        let registry = CompositeTerminable::<String>::new();
        registry.add(Arc::new(from_fn(|| Ok::<_, String>(()))));
        assert_eq!(format!("{:?}", registry), "CompositeTerminable { pending: 1 }");
    }

    #[cfg(feature = "tracing")]
    mod tracing_tests {
        use super::*;
        use tracing_test::traced_test;

        #[test]
        #[traced_test]
        fn test_close_all_logs_failures() {
            let registry = CompositeTerminable::<String>::new();
            registry.add(Arc::new(from_fn(|| Err::<(), _>("E1".to_string()))));
            let _ = registry.close_all();
            assert!(logs_contain("resource failed to close"));
            assert!(logs_contain("close pass finished"));
        }

        #[test]
        #[traced_test]
        fn test_close_unchecked_reports_causes() {
            let registry = CompositeTerminable::<String>::new();
            registry.add(Arc::new(from_fn(|| Err::<(), _>("disk gone".to_string()))));
            registry.close_unchecked();
            assert!(logs_contain("\"disk gone\""));
        }
    }
}
