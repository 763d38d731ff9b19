//! Geometric level generator.

use rand::prelude::*;

use crate::level_generator::{LevelGenerator, LevelGeneratorError, validate_total};

/// A level generator using a geometric distribution.
///
/// This distribution assumes that if a node is present at some level `n`,
/// then the probability that it is present at level `n + 1` is some constant
/// `p` in `(0, 1)`. This produces a geometric distribution, albeit truncated
/// at the maximum number of levels allowed.
///
/// # Examples
///
/// ```
/// use skipdict::{Arena, Geometric, Natural, SkipDict};
///
/// let levels = Geometric::with_seed(16, 0.5, 42)?;
/// let mut dict = SkipDict::with_parts(Natural, levels, Arena::new())?;
/// dict.insert(1, "one")?;
/// assert_eq!(dict.get(&1), Some(&"one"));
/// # Ok::<(), skipdict::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Geometric {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The probability that a node is present in the next level.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
}

impl Geometric {
    /// Create a new geometric level generator with `total` number of levels,
    /// and `p` as the probability that a given node is present in the next
    /// level.
    ///
    /// # Errors
    ///
    /// `p` must be strictly between 0 and 1, and `total` must be at least 1
    /// and fit in an `i32`.
    #[inline]
    pub fn new(total: usize, p: f64) -> Result<Self, LevelGeneratorError> {
        Self::with_rng(total, p, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Like [`Geometric::new`], but seeded so that the sequence of levels is
    /// reproducible.
    ///
    /// # Errors
    ///
    /// See [`Geometric::new`].
    #[inline]
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Result<Self, LevelGeneratorError> {
        Self::with_rng(total, p, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(total: usize, p: f64, rng: SmallRng) -> Result<Self, LevelGeneratorError> {
        validate_total(total)?;
        if !(0.0 < p && p < 1.0) {
            return Err(LevelGeneratorError::InvalidProbability);
        }
        Ok(Geometric { total, p, rng })
    }
}

impl<K: ?Sized> LevelGenerator<K> for Geometric {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    /// Generate a level for a new node using a geometric distribution.
    ///
    /// This function generate a random level in the range `[0, total)` by
    /// sampling from a uniform distribution and inverting the cumulative
    /// distribution function (CDF) of the truncated geometric distribution.
    ///
    /// The CDF of the truncated geometric distribution is
    ///
    /// ```text
    /// CDF(n) = (1 - p^n) / (1 - p^t)
    /// ```
    ///
    /// where `t` is the total number of levels. Inverting it for `n` gives:
    ///
    /// ```text
    /// n = floor(log_p(1 - (1 - p^t) * u))
    /// ```
    ///
    /// where `u` is drawn uniformly from `[0, 1)`.
    #[inline]
    #[expect(clippy::float_arithmetic, reason = "Computing inverse CDF")]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "CDF domain is [0, total] so the cast is safe"
    )]
    #[expect(clippy::as_conversions, reason = "No other way to do this")]
    fn level(&mut self, _key: &K) -> usize {
        // `total` was checked to fit in an i32 on construction.
        let exponent = i32::try_from(self.total).unwrap_or(i32::MAX);
        let u = self.rng.random::<f64>();
        let n = (1.0 - (1.0 - self.p.powi(exponent)) * u).log(self.p).floor() as usize;
        // Rounding may land exactly on `total`.
        n.min(self.total - 1)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Geometric, LevelGenerator};
    use crate::level_generator::LevelGeneratorError;

    #[test]
    fn invalid_max() {
        assert_eq!(
            Geometric::new(0, 0.5).err(),
            Some(LevelGeneratorError::ZeroMax)
        );
    }

    #[test]
    fn invalid_p() {
        assert_eq!(
            Geometric::new(1, 0.0).err(),
            Some(LevelGeneratorError::InvalidProbability)
        );
        assert_eq!(
            Geometric::new(1, 1.0).err(),
            Some(LevelGeneratorError::InvalidProbability)
        );
        assert_eq!(
            Geometric::new(1, f64::NAN).err(),
            Some(LevelGeneratorError::InvalidProbability)
        );
    }

    #[rstest]
    fn new(
        #[values(1, 2, 16, 128, 1024)] n: usize,
        #[values(0.01, 0.1, 0.5, 0.99)] p: f64,
    ) -> Result<()> {
        let mut generator = Geometric::new(n, p)?;
        assert_eq!(LevelGenerator::<()>::total(&generator), n);
        for _ in 0..10_000 {
            let level = generator.level(&());
            assert!((0..n).contains(&level));
        }
        // Make sure that we can produce at least one level-0 node.
        let found = (0..10_000).any(|_| generator.level(&()) == 0);
        if !found {
            bail!("Failed to generate a level-0 node.");
        }
        Ok(())
    }

    #[test]
    fn reaches_top_level() -> Result<()> {
        let mut generator = Geometric::new(4, 0.5)?;
        let found = (0..100_000).any(|_| generator.level(&()) == 3);
        if !found {
            bail!("Failed to generate a level-3 node.");
        }
        Ok(())
    }

    #[test]
    fn roughly_halves() -> Result<()> {
        let mut generator = Geometric::with_seed(16, 0.5, 0x1234_abcd)?;
        let samples = 100_000;
        let mut counts = [0_usize; 16];
        for _ in 0..samples {
            counts[generator.level(&())] += 1;
        }
        // About half the nodes stay on level 0, a quarter on level 1.
        assert!((45_000..55_000).contains(&counts[0]), "{counts:?}");
        assert!((20_000..30_000).contains(&counts[1]), "{counts:?}");
        Ok(())
    }

    #[test]
    fn seeded_is_reproducible() -> Result<()> {
        let mut first = Geometric::with_seed(33, 0.25, 7)?;
        let mut second = Geometric::with_seed(33, 0.25, 7)?;
        let a: Vec<usize> = (0..100).map(|_| first.level(&0_u64)).collect();
        let b: Vec<usize> = (0..100).map(|_| second.level(&0_u64)).collect();
        assert_eq!(a, b);
        Ok(())
    }
}
