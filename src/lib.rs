//! A skiplist is a way of storing elements in such a way that elements can be
//! efficiently accessed, inserted and removed, all in `O(log(n))` on average.
//!
//! Conceptually, a skiplist resembles something like:
//!
//! ```text
//! <head> ----------> [2] --------------------------------------------------> [9] ---------->
//! <head> ----------> [2] ------------------------------------[7] ----------> [9] ---------->
//! <head> ----------> [2] ----------> [4] ------------------> [7] ----------> [9] --> [10] ->
//! <head> --> [1] --> [2] --> [3] --> [4] --> [5] --> [6] --> [7] --> [8] --> [9] --> [10] ->
//! ```
//!
//! where each node `[x]` has references to nodes further down the list,
//! allowing the algorithm to effectively skip ahead.
//!
//! This crate provides [`SkipDict`], a skiplist used as an ordered map from
//! unique keys to values.  How keys are ordered, how tall nodes grow, and
//! where nodes live are all injected:
//!
//! - [`Comparator`]: the ordering of keys, which also decides key equality.
//!   Defaults to [`Natural`], the key's [`Ord`].
//! - [`LevelGenerator`]: the level of each new node.  Defaults to [`Uniform`]
//!   over [`DEFAULT_MAX_LEVELS`] levels.
//! - [`Storage`]: allocation of nodes.  Defaults to an unbounded [`Arena`].
//!
//! ```
//! use skipdict::SkipDict;
//!
//! let mut dict = SkipDict::new();
//! dict.insert("b", 2)?;
//! dict.insert("a", 1)?;
//! dict.insert("c", 3)?;
//!
//! assert_eq!(dict.to_string(), "[(a, 1), (b, 2), (c, 3)]");
//! assert_eq!(dict.pop_back(), Some(("c", 3)));
//! # Ok::<(), skipdict::Error>(())
//! ```
//!
//! The comparator **must** be well-behaved, see [`Comparator`] for details.

mod comparator;
mod error;
mod level_generator;
mod skipdict;
mod skipnode;
mod storage;

pub use crate::comparator::{Comparator, Natural};
pub use crate::error::{Error, InsertError};
pub use crate::level_generator::{
    DEFAULT_MAX_LEVELS, FromFn, Geometric, LevelGenerator, LevelGeneratorError, Uniform,
};
pub use crate::skipdict::{IntoIter, Iter, Keys, SkipDict, Values};
pub use crate::skipnode::SkipNode;
pub use crate::storage::{Arena, NodeId, Rejected, Storage, StorageError};
