//! Level generator backed by a closure.

use std::fmt;

use crate::level_generator::{LevelGenerator, LevelGeneratorError, validate_total};

/// A level generator which defers to a closure, allowing levels that depend on
/// the key being inserted (or simply fixed, as is handy in tests).
///
/// The closure should only return levels below `total`; larger levels are
/// clamped by the skipdict.
///
/// # Examples
///
/// ```
/// use skipdict::{Arena, FromFn, Natural, SkipDict};
///
/// // Every fourth key is promoted to the express lanes.
/// let levels = FromFn::new(4, |key: &u64| if key % 4 == 0 { 3 } else { 0 })?;
/// let mut dict = SkipDict::with_parts(Natural, levels, Arena::new())?;
/// dict.extend((0..16_u64).map(|k| (k, k * k)));
/// assert_eq!(dict.get(&12), Some(&144));
/// # Ok::<(), skipdict::Error>(())
/// ```
pub struct FromFn<F> {
    total: usize,
    f: F,
}

impl<F> FromFn<F> {
    /// Wrap `f`, declaring `total` levels.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1 and fit in an `i32`.
    #[inline]
    pub fn new(total: usize, f: F) -> Result<Self, LevelGeneratorError> {
        validate_total(total)?;
        Ok(FromFn { total, f })
    }
}

impl<K, F> LevelGenerator<K> for FromFn<F>
where
    K: ?Sized,
    F: FnMut(&K) -> usize,
{
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    #[inline]
    fn level(&mut self, key: &K) -> usize {
        (self.f)(key)
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn")
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::FromFn;
    use crate::level_generator::{LevelGenerator, LevelGeneratorError};

    #[test]
    fn key_dependent() {
        let mut generator = FromFn::new(8, |key: &u32| key.trailing_zeros() as usize).unwrap();
        assert_eq!(LevelGenerator::<u32>::total(&generator), 8);
        assert_eq!(generator.level(&1_u32), 0);
        assert_eq!(generator.level(&4_u32), 2);
        assert_eq!(generator.level(&96_u32), 5);
    }

    #[test]
    fn stateful() {
        let mut calls = 0;
        let mut generator = FromFn::new(3, |_: &str| {
            calls += 1;
            calls % 3
        })
        .unwrap();
        let levels: Vec<_> = (0..5).map(|_| generator.level("k")).collect();
        assert_eq!(levels, [1, 2, 0, 1, 2]);
    }

    #[test]
    fn zero_levels() {
        assert_eq!(
            FromFn::new(0, |_: &u8| 0).err(),
            Some(LevelGeneratorError::ZeroMax)
        );
        assert_eq!(
            format!("{:?}", FromFn::new(2, |_: &u8| 0).unwrap()),
            "FromFn { total: 2, .. }"
        );
    }
}
