//! Node storage for the skipdict.
//!
//! Rather than linking nodes through raw pointers, every node of a
//! [`SkipDict`][crate::SkipDict] lives in a [`Storage`] and is addressed by a
//! [`NodeId`].  A forward link is then just an `Option<NodeId>`, which makes
//! dangling links impossible to dereference: a stale id simply fails to
//! resolve.
//!
//! The default storage is [`Arena`], a slab with a free list.  It can be
//! [bounded][Arena::bounded], in which case allocating past the bound fails
//! with [`StorageError::Full`] instead of growing.

use std::collections::TryReserveError;
use std::{fmt, mem};

use thiserror::Error;

// ////////////////////////////////////////////////////////////////////////////
// Node Id
// ////////////////////////////////////////////////////////////////////////////

/// Stable handle to a value held by a [`Storage`].
///
/// A handle stays valid until the value is removed, after which the storage
/// is free to hand the same handle out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a raw slot index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    /// The raw slot index behind this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Storage
// ////////////////////////////////////////////////////////////////////////////

/// Errors that can occur when a [`Storage`] allocates a new slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum StorageError {
    /// The storage reached its fixed capacity.
    #[error("storage is full (capacity {capacity}).")]
    Full {
        /// The number of values the storage can hold.
        capacity: usize,
    },
    /// The allocator could not provide more memory.
    #[error("failed to allocate a node: {0}")]
    Alloc(#[from] TryReserveError),
}

/// A value the storage could not take, handed back along with the reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct Rejected<T> {
    value: T,
    error: StorageError,
}

impl<T> Rejected<T> {
    /// Pair a value with the reason it was refused.
    #[inline]
    #[must_use]
    pub const fn new(value: T, error: StorageError) -> Self {
        Rejected { value, error }
    }

    /// Why the value was refused.
    #[inline]
    #[must_use]
    pub const fn error(&self) -> &StorageError {
        &self.error
    }

    /// Take back the refused value.
    #[inline]
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into the refused value and the reason.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (T, StorageError) {
        (self.value, self.error)
    }
}

impl<T> From<Rejected<T>> for StorageError {
    #[inline]
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

/// Slab-like storage with stable handles.
///
/// This is the "allocate a node" / "free a node" capability of the skipdict.
/// Implementations must guarantee that a handle returned by
/// [`try_insert`][Storage::try_insert] resolves to the same value until it is
/// passed to [`remove`][Storage::remove].
pub trait Storage<T> {
    /// Store `value`, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns the value, wrapped in [`Rejected`], if no slot could be
    /// allocated.  The storage is left unchanged.
    fn try_insert(&mut self, value: T) -> Result<NodeId, Rejected<T>>;

    /// Remove and return the value behind `id`, if any.
    fn remove(&mut self, id: NodeId) -> Option<T>;

    /// Reference to the value behind `id`, if any.
    #[must_use]
    fn get(&self, id: NodeId) -> Option<&T>;

    /// Mutable reference to the value behind `id`, if any.
    #[must_use]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut T>;

    /// Number of values currently stored.
    #[must_use]
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Arena
// ////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied(T),
    // Vacant slots form a singly linked free list.
    Vacant { next_free: Option<NodeId> },
}

/// Contiguous storage addressed by [`NodeId`], reusing freed slots.
///
/// # Examples
///
/// ```
/// use skipdict::{Arena, Storage, StorageError};
///
/// let mut arena = Arena::bounded(1);
/// let id = arena.try_insert("a")?;
/// let rejected = arena.try_insert("b").unwrap_err();
/// assert_eq!(rejected.error(), &StorageError::Full { capacity: 1 });
/// assert_eq!(rejected.into_value(), "b");
/// assert_eq!(arena.remove(id), Some("a"));
/// assert!(arena.try_insert("b").is_ok());
/// # Ok::<(), StorageError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    /// Head of the free list.
    free: Option<NodeId>,
    len: usize,
    limit: Option<usize>,
}

impl<T> Arena<T> {
    /// Create a new, empty, unbounded arena.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: None,
            len: 0,
            limit: None,
        }
    }

    /// Create an unbounded arena with room for `capacity` values before it
    /// needs to reallocate.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            free: None,
            len: 0,
            limit: None,
        }
    }

    /// Create an arena which refuses to hold more than `limit` values.
    #[inline]
    #[must_use]
    pub const fn bounded(limit: usize) -> Self {
        Arena {
            slots: Vec::new(),
            free: None,
            len: 0,
            limit: Some(limit),
        }
    }

    /// The maximum number of values this arena accepts, if bounded.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl<T> Default for Arena<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> for Arena<T> {
    fn try_insert(&mut self, value: T) -> Result<NodeId, Rejected<T>> {
        if let Some(limit) = self.limit {
            if self.len >= limit {
                return Err(Rejected::new(value, StorageError::Full { capacity: limit }));
            }
        }

        if let Some(id) = self.free {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                if let Slot::Vacant { next_free } = *slot {
                    self.free = next_free;
                    *slot = Slot::Occupied(value);
                    self.len += 1;
                    return Ok(id);
                }
            }
        }

        if let Err(err) = self.slots.try_reserve(1) {
            return Err(Rejected::new(value, err.into()));
        }
        let id = NodeId(self.slots.len());
        self.slots.push(Slot::Occupied(value));
        self.len += 1;
        Ok(id)
    }

    fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if matches!(slot, Slot::Vacant { .. }) {
            return None;
        }
        match mem::replace(slot, Slot::Vacant { next_free: self.free }) {
            Slot::Occupied(value) => {
                self.free = Some(id);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => None,
        }
    }

    #[inline]
    fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }
}
