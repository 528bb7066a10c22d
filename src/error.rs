//! Error types surfaced at the interval-collection boundary.
//!
//! Precondition violations (a malformed interval) are programmer errors and panic at
//! construction time instead of being represented here; see [`crate::interval::Interval::new`].

use std::{error, fmt};

/// Returned by `span()` and `choose()` when the collection holds no intervals.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EmptyCollectionError;

impl fmt::Display for EmptyCollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the collection is empty")
    }
}

impl error::Error for EmptyCollectionError {}

/// Returned by `add`, `remove` and `clear` on a read-only (static) index.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReadOnlyError;

impl fmt::Display for ReadOnlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "this index is built once and cannot be mutated")
    }
}

impl error::Error for ReadOnlyError {}
