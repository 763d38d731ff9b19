//! Crate-level error type.

use std::fmt;

use thiserror::Error;

use crate::level_generator::LevelGeneratorError;
use crate::storage::StorageError;

/// Errors returned by the fallible operations of a
/// [`SkipDict`][crate::SkipDict].
///
/// "Key not found" is never an error; lookups and removals return `Option`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A node could not be allocated.  The skipdict is unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The level generator cannot be used.
    #[error(transparent)]
    LevelGenerator(#[from] LevelGeneratorError),
}

/// A failed insertion, handing the entry back to the caller.
///
/// Returned by [`SkipDict::try_insert`][crate::SkipDict::try_insert].
#[expect(
    clippy::module_name_repetitions,
    reason = "Mirrors the naming of the other error types."
)]
pub struct InsertError<K, V> {
    key: K,
    value: V,
    error: Error,
}

impl<K, V> InsertError<K, V> {
    pub(crate) const fn new(key: K, value: V, error: Error) -> Self {
        InsertError { key, value, error }
    }

    /// The key that could not be inserted.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Why the insertion failed.
    #[inline]
    #[must_use]
    pub const fn error(&self) -> &Error {
        &self.error
    }

    /// Take back the entry.
    #[inline]
    #[must_use]
    pub fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Drop the entry, keeping the reason.
    #[inline]
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<K, V> From<InsertError<K, V>> for Error {
    #[inline]
    fn from(err: InsertError<K, V>) -> Self {
        err.error
    }
}

impl<K, V> fmt::Debug for InsertError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<K, V> fmt::Display for InsertError<K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to insert entry: {}", self.error)
    }
}

impl<K, V> std::error::Error for InsertError<K, V> {
    #[inline]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
