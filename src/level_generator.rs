//! Skiplists use a probabilistic distribution of nodes over the internal
//! levels, whereby the lowest level (level 0) contains all the nodes, and each
//! level `n > 0` will contain a subset of the nodes on level `n - 1`.
//!
//! The skipdict does not decide how tall a node is; upon insertion it asks its
//! [`LevelGenerator`].  Three generators are provided:
//!
//! - [`Uniform`]: every level in `[0, total)` is equally likely.  This
//!   is the default.
//! - [`Geometric`]: the chance that a node occupies level `n` is `p` times
//!   the chance of occupying level `n - 1`.
//! - [`FromFn`]: any closure, which may look at the key being inserted.
//!
//! Reproducibility is the generator's business, not the list's: seed the
//! generator (e.g. [`Uniform::with_seed`]) to get the same shape every run.

mod from_fn;
mod geometric;
mod uniform;

use thiserror::Error;

pub use from_fn::FromFn;
pub use geometric::Geometric;
pub use uniform::Uniform;

/// Number of levels used when none is specified.
pub const DEFAULT_MAX_LEVELS: usize = 33;

// ////////////////////////////////////////////////////////////////////////////
// Level Generator
// ////////////////////////////////////////////////////////////////////////////

/// Upon the insertion of a new node in the list, the node is replicated to high
/// levels as determined by a [`LevelGenerator`].
pub trait LevelGenerator<K: ?Sized> {
    /// The total number of levels that are assumed to exist.
    #[must_use]
    fn total(&self) -> usize;

    /// Generate a level for a new node holding `key`, in the range `[0,
    /// total)`.
    ///
    /// A node at level `n` takes part in the levels `0..=n`.  This function
    /// should _never_ return a level greater or equal to
    /// [`total`][LevelGenerator::total].
    #[must_use]
    fn level(&mut self, key: &K) -> usize;
}

/// Errors that can occur when creating a level generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum LevelGeneratorError {
    /// The maximum number of levels must be non-zero.
    #[error("max must be non-zero.")]
    ZeroMax,
    /// The maximum number of levels must be less than `i32::MAX`.
    #[error("max must be less than i32::MAX.")]
    MaxTooLarge,
    /// The probability `p` must be in the range `(0, 1)`.
    #[error("p must be in (0, 1).")]
    InvalidProbability,
}

/// Checks the number of levels shared by all generators.
fn validate_total(total: usize) -> Result<(), LevelGeneratorError> {
    if total == 0 {
        return Err(LevelGeneratorError::ZeroMax);
    }
    if i32::try_from(total).is_err() {
        return Err(LevelGeneratorError::MaxTooLarge);
    }
    Ok(())
}
