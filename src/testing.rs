//! Testing utilities for code that registers resources
//!
//! [`MockResource`] is a configurable resource that records what happened to
//! it, and [`CloseLog`] records the order in which a set of mocks was closed.
//!
//! # Examples
//!
//! ```rust
//! use terminable::testing::{CloseLog, MockResource};
//! use terminable::{assert_close_failures, assert_close_order, CompositeTerminable};
//!
//! let log = CloseLog::new();
//! let registry: CompositeTerminable = CompositeTerminable::new();
//! registry
//!     .add(MockResource::new("db", &log).build())
//!     .add(MockResource::new("cache", &log).failing("E1").build());
//!
//! assert_close_failures!(registry.close_all(), ["E1"]);
//! assert_close_order!(log, ["cache", "db"]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::terminable::{CloseFlag, ClosedCheck, Reset, Terminable};

/// Shared, ordered record of closed resource names.
#[derive(Debug, Clone, Default)]
pub struct CloseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CloseLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name.
    pub fn record(&self, name: impl Into<String>) {
        self.entries.lock().push(name.into());
    }

    /// Snapshot of every recorded name, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// How many times `name` was recorded.
    pub fn count(&self, name: &str) -> usize {
        self.entries.lock().iter().filter(|n| *n == name).count()
    }

    /// Total number of recorded names.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Error returned by a [`MockResource`] configured with [`MockResource::failing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCloseError(pub String);

impl fmt::Display for MockCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockCloseError {}

/// Something that happened to a [`MockResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// `close` was called.
    Close,
    /// The reset hook ran.
    Reset,
    /// The closed check was queried.
    ClosedCheck,
}

/// A resource for tests.
///
/// By default it closes successfully and exposes neither optional capability.
/// Builder methods switch on failure, the closed check and the reset hook.
#[derive(Debug)]
pub struct MockResource {
    name: String,
    log: CloseLog,
    failure: Option<String>,
    queryable: bool,
    resettable: bool,
    close_on_reset: bool,
    flag: CloseFlag,
    closes: AtomicUsize,
    resets: AtomicUsize,
    events: Mutex<Vec<MockEvent>>,
}

impl MockResource {
    /// A resource that records `name` in `log` each time it is closed.
    pub fn new(name: impl Into<String>, log: &CloseLog) -> Self {
        MockResource {
            name: name.into(),
            log: log.clone(),
            failure: None,
            queryable: false,
            resettable: false,
            close_on_reset: false,
            flag: CloseFlag::new(),
            closes: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Fail every close with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Expose the closed check.
    pub fn queryable(mut self) -> Self {
        self.queryable = true;
        self
    }

    /// Expose the reset hook.
    pub fn resettable(mut self) -> Self {
        self.resettable = true;
        self
    }

    /// Expose the reset hook and make it mark the resource closed.
    pub fn closes_on_reset(mut self) -> Self {
        self.resettable = true;
        self.close_on_reset = true;
        self
    }

    /// Finish building.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The name recorded on close.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of reset hook runs.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Every event, oldest first.
    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().clone()
    }

    /// Simulate the resource being closed outside of any registry.
    pub fn mark_closed(&self) {
        self.flag.mark_closed();
    }

    /// Whether the resource is closed, without recording an event.
    pub fn is_closed(&self) -> bool {
        self.flag.is_closed()
    }
}

impl Terminable for MockResource {
    type Error = MockCloseError;

    fn close(&self) -> Result<(), MockCloseError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.events.lock().push(MockEvent::Close);
        self.log.record(self.name.clone());
        match &self.failure {
            Some(message) => Err(MockCloseError(message.clone())),
            None => {
                self.flag.mark_closed();
                Ok(())
            }
        }
    }

    fn as_closed_check(&self) -> Option<&dyn ClosedCheck> {
        if self.queryable {
            Some(self)
        } else {
            None
        }
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        if self.resettable {
            Some(self)
        } else {
            None
        }
    }
}

impl ClosedCheck for MockResource {
    fn is_closed(&self) -> bool {
        self.events.lock().push(MockEvent::ClosedCheck);
        self.flag.is_closed()
    }
}

impl Reset for MockResource {
    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.events.lock().push(MockEvent::Reset);
        if self.close_on_reset {
            self.flag.mark_closed();
        }
    }
}

/// Assert that a [`CloseLog`] recorded exactly these names, in this order.
///
/// # Example
///
/// ```rust
/// use terminable::assert_close_order;
/// use terminable::testing::CloseLog;
///
/// let log = CloseLog::new();
/// log.record("b");
/// log.record("a");
/// assert_close_order!(log, ["b", "a"]);
/// ```
#[macro_export]
macro_rules! assert_close_order {
    ($log:expr, $expected:expr) => {{
        let expected: ::std::vec::Vec<::std::string::String> =
            $expected.iter().map(|name| name.to_string()).collect();
        assert_eq!($log.entries(), expected, "unexpected close order");
    }};
}

/// Assert that a close result failed with exactly these causes, in order.
///
/// Causes are compared through their `Display` output.
///
/// # Example
///
/// ```rust
/// use terminable::{assert_close_failures, CompositeCloseError};
///
/// let result: Result<(), _> = Err(CompositeCloseError::new(vec!["E1", "E2"]));
/// assert_close_failures!(result, ["E1", "E2"]);
/// ```
#[macro_export]
macro_rules! assert_close_failures {
    ($result:expr, $expected:expr) => {
        match $result {
            Err(err) => {
                let causes: ::std::vec::Vec<::std::string::String> =
                    err.iter().map(|cause| cause.to_string()).collect();
                let expected: ::std::vec::Vec<::std::string::String> =
                    $expected.iter().map(|cause| cause.to_string()).collect();
                assert_eq!(causes, expected, "unexpected close failures");
            }
            Ok(()) => {
                panic!("Expected close failures {:?}, got Ok", $expected);
            }
        }
    };
}
