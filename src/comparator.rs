//! Key ordering.
//!
//! The skipdict never compares keys directly; it asks its [`Comparator`].  The
//! comparator is the single source of truth for both ordering *and* equality:
//! two keys are the same key exactly when the comparator returns
//! [`Ordering::Equal`].
//!
//! A comparator **must** be well-behaved.  Given `f(a, b)`:
//!
//! - Be well defined: `f(a, b)` should always return the same value
//! - Be anti-symmetric: `f(a, b) == Greater` iff `f(b, a) == Less`, and
//!   `f(a, b) == Equal` iff `f(b, a) == Equal`.
//! - Be transitive: if `f(a, b) == Greater` and `f(b, c) == Greater` then
//!   `f(a, c) == Greater`.
//!
//! Failure to satisfy these properties will not cause memory unsafety, but
//! lookups may miss entries and the iteration order is unspecified.

use std::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Any `Fn(&K, &K) -> Ordering` is a comparator, so context can be captured by
/// the closure:
///
/// ```
/// use skipdict::SkipDict;
///
/// let descending = true;
/// let mut dict = SkipDict::with_comparator(move |a: &u64, b: &u64| {
///     if descending { b.cmp(a) } else { a.cmp(b) }
/// });
/// dict.extend([(1, "a"), (3, "c"), (2, "b")]);
/// assert_eq!(dict.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compare two keys.
    #[must_use]
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The natural order of keys implementing [`Ord`].
///
/// This is the default comparator, and in particular the comparator for
/// unsigned 64-bit keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K, F> Comparator<K> for F
where
    K: ?Sized,
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Comparator, Natural};

    #[rstest]
    #[case(0, 0, Ordering::Equal)]
    #[case(1, 2, Ordering::Less)]
    #[case(u64::MAX, 0, Ordering::Greater)]
    fn natural_u64(#[case] a: u64, #[case] b: u64, #[case] expected: Ordering) {
        assert_eq!(Natural.compare(&a, &b), expected);
    }

    #[test]
    fn natural_unsized() {
        assert_eq!(Natural.compare("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn closure_with_context() {
        let modulus = 10_u32;
        let by_last_digit = |a: &u32, b: &u32| (a % modulus).cmp(&(b % modulus));
        assert_eq!(by_last_digit.compare(&19, &21), Ordering::Greater);
        assert_eq!(by_last_digit.compare(&13, &3), Ordering::Equal);
    }
}
