//! Uniform level generator.

use rand::prelude::*;

use crate::level_generator::{
    DEFAULT_MAX_LEVELS, LevelGenerator, LevelGeneratorError, validate_total,
};

/// A level generator drawing every level in `[0, total)` with equal
/// probability, independently for each insertion.
///
/// This is the default generator of a [`SkipDict`][crate::SkipDict], with
/// [`DEFAULT_MAX_LEVELS`] levels.
#[derive(Debug, Clone)]
pub struct Uniform {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The random number generator.
    rng: SmallRng,
}

impl Uniform {
    /// Create a new uniform level generator with `total` number of levels,
    /// seeded from the thread-local random number generator.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1 and fit in an `i32`.
    #[inline]
    pub fn new(total: usize) -> Result<Self, LevelGeneratorError> {
        validate_total(total)?;
        Ok(Uniform {
            total,
            rng: SmallRng::from_rng(&mut rand::rng()),
        })
    }

    /// Create a new uniform level generator whose sequence of levels is
    /// determined by `seed`.
    ///
    /// # Errors
    ///
    /// See [`Uniform::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::{LevelGenerator, Uniform};
    ///
    /// let mut a = Uniform::with_seed(8, 1)?;
    /// let mut b = Uniform::with_seed(8, 1)?;
    /// for key in 0..10_u64 {
    ///     assert_eq!(a.level(&key), b.level(&key));
    /// }
    /// # Ok::<(), skipdict::LevelGeneratorError>(())
    /// ```
    #[inline]
    pub fn with_seed(total: usize, seed: u64) -> Result<Self, LevelGeneratorError> {
        validate_total(total)?;
        Ok(Uniform {
            total,
            rng: SmallRng::seed_from_u64(seed),
        })
    }
}

impl Default for Uniform {
    #[inline]
    fn default() -> Self {
        Uniform {
            total: DEFAULT_MAX_LEVELS,
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }
}

impl<K: ?Sized> LevelGenerator<K> for Uniform {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    #[inline]
    fn level(&mut self, _key: &K) -> usize {
        self.rng.random_range(0..self.total)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::Uniform;
    use crate::level_generator::{DEFAULT_MAX_LEVELS, LevelGenerator, LevelGeneratorError};

    #[test]
    fn invalid_max() {
        assert_eq!(Uniform::new(0).err(), Some(LevelGeneratorError::ZeroMax));
        assert_eq!(
            Uniform::with_seed(0, 1).err(),
            Some(LevelGeneratorError::ZeroMax)
        );
    }

    #[test]
    fn default_total() {
        let generator = Uniform::default();
        assert_eq!(LevelGenerator::<u64>::total(&generator), DEFAULT_MAX_LEVELS);
    }

    #[rstest]
    fn covers_range(#[values(1, 2, 7, 33)] n: usize) -> Result<()> {
        let mut generator = Uniform::new(n)?;
        let mut seen = vec![false; n];
        for _ in 0..100_000 {
            let level = generator.level(&());
            assert!((0..n).contains(&level));
            seen[level] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            bail!("Level {missing} was never generated.");
        }
        Ok(())
    }
}
