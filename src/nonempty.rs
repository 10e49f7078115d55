//! Non-empty vector used to hold close failures
//!
//! A drain that captured nothing never builds an error, so the causes of a
//! [`CompositeCloseError`](crate::CompositeCloseError) are stored in a
//! `NonEmptyVec<T>`: a vector that cannot be constructed without at least
//! one element.
//!
//! # Examples
//!
//! ```
//! use terminable::NonEmptyVec;
//!
//! let causes = NonEmptyVec::new("socket reset", vec!["disk full"]);
//! assert_eq!(causes.head(), &"socket reset");
//! assert_eq!(causes.len(), 2);
//!
//! assert!(NonEmptyVec::<&str>::from_vec(Vec::new()).is_none());
//! ```

use crate::Semigroup;

/// A vector guaranteed to contain at least one element.
///
/// Element order is insertion order; `head` is the first element pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyVec<T> {
    head: T,
    tail: Vec<T>,
}

impl<T> NonEmptyVec<T> {
    /// Create a non-empty vector from a first element and the rest.
    pub fn new(head: T, tail: Vec<T>) -> Self {
        Self { head, tail }
    }

    /// Try to build a non-empty vector from a `Vec`, keeping its order.
    ///
    /// Returns `None` if the vector is empty.
    pub fn from_vec(vec: Vec<T>) -> Option<Self> {
        let mut items = vec.into_iter();
        let head = items.next()?;
        Some(Self::new(head, items.collect()))
    }

    /// The first element.
    pub fn head(&self) -> &T {
        &self.head
    }

    /// Every element after the first.
    pub fn tail(&self) -> &[T] {
        &self.tail
    }

    /// The last element.
    pub fn last(&self) -> &T {
        self.tail.last().unwrap_or(&self.head)
    }

    /// Number of elements, always at least 1.
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Always `false`; present to satisfy clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Convert into a plain `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        let mut vec = Vec::with_capacity(self.len());
        vec.push(self.head);
        vec.extend(self.tail);
        vec
    }

    /// Combine every element, left to right.
    ///
    /// No identity element is needed because there is always a first one.
    ///
    /// # Example
    ///
    /// ```
    /// use terminable::{CompositeCloseError, NonEmptyVec};
    ///
    /// let levels = NonEmptyVec::new(
    ///     CompositeCloseError::new(vec!["E1"]),
    ///     vec![CompositeCloseError::new(vec!["E2", "E3"])],
    /// );
    /// assert_eq!(levels.reduce().len(), 3);
    /// ```
    pub fn reduce(self) -> T
    where
        T: Semigroup,
    {
        self.tail.into_iter().fold(self.head, Semigroup::combine)
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}

// Semigroup: concatenation
impl<T> Semigroup for NonEmptyVec<T> {
    fn combine(mut self, other: Self) -> Self {
        self.tail.push(other.head);
        self.tail.extend(other.tail);
        self
    }
}

impl<T> IntoIterator for NonEmptyVec<T> {
    type Item = T;
    type IntoIter = std::iter::Chain<std::iter::Once<T>, std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self.head).chain(self.tail)
    }
}

impl<'a, T> IntoIterator for &'a NonEmptyVec<T> {
    type Item = &'a T;
    type IntoIter = std::iter::Chain<std::iter::Once<&'a T>, std::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}
