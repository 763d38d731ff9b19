//! SkipDict stores key-value pairs, with the keys being unique and always
//! sorted.

use std::{cmp::Ordering, fmt, hash, hash::Hash, iter, marker::PhantomData, mem, ops::ControlFlow};

use tracing::{debug, trace, warn};

use crate::comparator::{Comparator, Natural};
use crate::error::{Error, InsertError};
use crate::level_generator::{LevelGenerator, LevelGeneratorError, Uniform};
use crate::skipnode::SkipNode;
use crate::storage::{Arena, NodeId, Storage, StorageError};

// ////////////////////////////////////////////////////////////////////////////
// SkipDict
// ////////////////////////////////////////////////////////////////////////////

/// The skipdict provides a way of storing element pairs such that the keys
/// are always sorted whilst at the same time providing an efficient way to
/// access, insert and remove entries.
///
/// Three capabilities are injected:
///
/// - a [`Comparator`] (`C`) deciding the order, and equality, of keys;
/// - a [`LevelGenerator`] (`L`) deciding how tall each new node is;
/// - a [`Storage`] (`S`) allocating and freeing the nodes.
///
/// Note that mutable references to keys are not available at all as this could
/// result in a node being left out of the proper ordering.
///
/// # Examples
///
/// ```
/// use skipdict::SkipDict;
///
/// let mut dict = SkipDict::new();
/// dict.insert(5, "e")?;
/// dict.insert(1, "a")?;
/// dict.insert(3, "c")?;
///
/// assert_eq!(dict.front(), Some((&1, &"a")));
/// assert_eq!(dict.back(), Some((&5, &"e")));
/// assert_eq!(dict.remove(&3), Some("c"));
/// assert_eq!(dict.get(&3), None);
/// assert_eq!(dict.len(), 2);
/// # Ok::<(), skipdict::Error>(())
/// ```
pub struct SkipDict<K, V, C = Natural, L = Uniform, S = Arena<SkipNode<K, V>>>
where
    S: Storage<SkipNode<K, V>>,
{
    /// Forward links of the sentinel head, one per level.
    head: Vec<Option<NodeId>>,
    /// Scratch space for the update vector, as long as `head`.
    update: Vec<Option<NodeId>>,
    /// Number of levels in use; the head links at and above it are all `None`.
    highest: usize,
    len: usize,
    comparator: C,
    level_generator: L,
    storage: S,
    _marker: PhantomData<(K, V)>,
}

// ///////////////////////////////////////////////
// Constructors
// ///////////////////////////////////////////////

impl<K, V> SkipDict<K, V>
where
    K: Ord,
{
    /// Create a new skipdict ordered by `K`'s [`Ord`] implementation, with the
    /// default number of 33 levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict: SkipDict<u64, String> = SkipDict::new();
    /// assert!(dict.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(Natural, Uniform::default(), Arena::new())
    }

    /// Constructs a new, empty skipdict whose storage has room for
    /// `capacity` entries before it needs to grow.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::with_capacity(100);
    /// dict.extend((0..100).map(|x| (x, x)));
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::assemble(Natural, Uniform::default(), Arena::with_capacity(capacity))
    }
}

impl<K, V, C> SkipDict<K, V, C>
where
    C: Comparator<K>,
{
    /// Create a new skipdict using `comparator` to order the keys.
    ///
    /// The comparator must be well-behaved (see [`Comparator`]); it is also
    /// what decides whether two keys are the same key.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// // Case-insensitive keys.
    /// let mut dict = SkipDict::with_comparator(|a: &String, b: &String| {
    ///     a.to_lowercase().cmp(&b.to_lowercase())
    /// });
    /// dict.insert("Hello".to_string(), 1)?;
    /// assert_eq!(dict.insert("HELLO".to_string(), 2)?, Some(1));
    /// assert_eq!(dict.len(), 1);
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self::assemble(comparator, Uniform::default(), Arena::new())
    }
}

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    C: Comparator<K>,
    L: LevelGenerator<K>,
    S: Storage<SkipNode<K, V>>,
{
    /// Create a new skipdict from its three capabilities.
    ///
    /// The number of levels is taken from `level_generator`.  `storage` should
    /// be empty and is owned by the skipdict from now on.
    ///
    /// # Errors
    ///
    /// Fails if the level generator declares no levels, or if the head of the
    /// list cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::{Arena, Natural, SkipDict, Uniform};
    ///
    /// let levels = Uniform::with_seed(12, 0x1234_abcd)?;
    /// let mut dict = SkipDict::with_parts(Natural, levels, Arena::bounded(2))?;
    /// dict.insert(1, 'a')?;
    /// dict.insert(2, 'b')?;
    /// assert!(dict.insert(3, 'c').is_err());
    /// assert_eq!(dict.len(), 2);
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    pub fn with_parts(comparator: C, level_generator: L, storage: S) -> Result<Self, Error> {
        let total = level_generator.total();
        if total == 0 {
            return Err(LevelGeneratorError::ZeroMax.into());
        }
        let mut head = Vec::new();
        head.try_reserve_exact(total).map_err(StorageError::from)?;
        head.resize(total, None);
        let mut update = Vec::new();
        update.try_reserve_exact(total).map_err(StorageError::from)?;
        update.resize(total, None);
        Ok(SkipDict {
            head,
            update,
            highest: 0,
            len: 0,
            comparator,
            level_generator,
            storage,
            _marker: PhantomData,
        })
    }
}

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    /// Infallible constructor for generators known to declare levels.
    fn assemble(comparator: C, level_generator: L, storage: S) -> Self
    where
        L: LevelGenerator<K>,
    {
        let total = level_generator.total().max(1);
        SkipDict {
            head: vec![None; total],
            update: vec![None; total],
            highest: 0,
            len: 0,
            comparator,
            level_generator,
            storage,
            _marker: PhantomData,
        }
    }
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    C: Comparator<K>,
    L: LevelGenerator<K>,
    S: Storage<SkipNode<K, V>>,
{
    /// Insert the entry into the skipdict.
    ///
    /// If the key was already present (as decided by the comparator), its
    /// value is replaced and the old value returned; no node is allocated and
    /// the length is unchanged.
    ///
    /// # Errors
    ///
    /// Fails if a new node is needed and the storage cannot allocate it, in
    /// which case the skipdict is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    ///
    /// assert_eq!(dict.insert(1, "Hello")?, None);
    /// assert_eq!(dict.insert(2, "World")?, None);
    /// assert_eq!(dict.insert(1, "Goodbye")?, Some("Hello"));
    /// assert_eq!(dict.len(), 2);
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, Error> {
        self.try_insert(key, value).map_err(InsertError::into_error)
    }

    /// Insert the entry into the skipdict, handing it back on failure.
    ///
    /// This behaves as [`insert`][SkipDict::insert] except that the error
    /// still owns the key and value.
    ///
    /// # Errors
    ///
    /// Fails if a new node is needed and the storage cannot allocate it, in
    /// which case the skipdict is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::{Arena, Natural, SkipDict, Uniform};
    ///
    /// let mut dict = SkipDict::with_parts(Natural, Uniform::default(), Arena::bounded(0))?;
    /// let err = dict.try_insert(1, String::from("one")).unwrap_err();
    /// assert_eq!(err.into_entry(), (1, String::from("one")));
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError<K, V>> {
        let mut update = mem::take(&mut self.update);
        let result = self.insert_with(key, value, &mut update);
        self.update = update;
        result
    }

    fn insert_with(
        &mut self,
        key: K,
        value: V,
        update: &mut [Option<NodeId>],
    ) -> Result<Option<V>, InsertError<K, V>> {
        let last_lt = self.descend(
            |node| self.comparator.compare(node.key(), &key) == Ordering::Less,
            update,
        );

        if let Some(candidate) = self.next_of(last_lt, 0) {
            if let Some(node) = self.storage.get_mut(candidate) {
                if self.comparator.compare(node.key(), &key) == Ordering::Equal {
                    return Ok(Some(node.replace_value(value)));
                }
            }
        }

        let total = self.head.len();
        let mut level = self.level_generator.level(&key);
        if level >= total {
            warn!(level, total, "level generator exceeded its bound; clamping");
            level = total - 1;
        }

        let mut node = SkipNode::new(key, value, level);
        node.set_prev(last_lt);
        let id = self.storage.try_insert(node).map_err(|rejected| {
            let (node, err) = rejected.into_parts();
            debug!(%err, "failed to allocate a node");
            let (key, value) = node.into_inner();
            InsertError::new(key, value, err.into())
        })?;

        if level >= self.highest {
            trace!(from = self.highest, to = level + 1, "growing active levels");
            // Nothing was visited on the new levels; the head precedes the node.
            for slot in update.iter_mut().take(level + 1).skip(self.highest) {
                *slot = None;
            }
            self.highest = level + 1;
        }

        for lvl in 0..=level {
            let before = update.get(lvl).copied().flatten();
            let after = self.next_of(before, lvl);
            if let Some(node) = self.storage.get_mut(id) {
                node.set_next(lvl, after);
            }
            self.set_next_of(before, lvl, Some(id));
        }
        if let Some(next) = self.next_of(Some(id), 0) {
            if let Some(next) = self.storage.get_mut(next) {
                next.set_prev(Some(id));
            }
        }

        self.len += 1;
        Ok(None)
    }
}

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    C: Comparator<K>,
    S: Storage<SkipNode<K, V>>,
{
    /// Provides a reference to the value associated with `key`, or `None` if
    /// there is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// assert!(dict.get(&0).is_none());
    /// dict.extend((0..10).map(|x| (x, x)));
    /// assert_eq!(dict.get(&0), Some(&0));
    /// assert!(dict.get(&10).is_none());
    /// ```
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_key(key)
            .and_then(|id| self.storage.get(id))
            .map(SkipNode::value)
    }

    /// Provides a reference to the value associated with `key`, falling back
    /// to `default` if there is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = [(1, 10)].into_iter().collect();
    /// assert_eq!(dict.get_or(&1, &0), &10);
    /// assert_eq!(dict.get_or(&2, &0), &0);
    /// ```
    #[inline]
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Provides a mutable reference to the value associated with `key`, or
    /// `None` if there is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// if let Some(x) = dict.get_mut(&0) {
    ///     *x = 100;
    /// }
    /// assert_eq!(dict.get(&0), Some(&100));
    /// ```
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_key(key)?;
        self.storage.get_mut(id).map(SkipNode::value_mut)
    }

    /// Returns true if the key is contained in the skipdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// assert!(dict.contains_key(&4));
    /// assert!(!dict.contains_key(&15));
    /// ```
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_key(key).is_some()
    }

    /// Removes the entry with the given key, returning its value, or `None`
    /// if there is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// assert_eq!(dict.remove(&4), Some(4));
    /// assert!(dict.remove(&4).is_none());
    /// ```
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_key, value)| value)
    }

    /// Removes the entry with the given key, returning the stored key and its
    /// value, or `None` if there is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::with_comparator(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));
    /// dict.insert(-3, "three")?;
    /// assert_eq!(dict.remove_entry(&3), Some((-3, "three")));
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        if self.is_empty() {
            return None;
        }
        let mut update = mem::take(&mut self.update);
        let last_lt = self.descend(
            |node| self.comparator.compare(node.key(), key) == Ordering::Less,
            &mut update,
        );
        let removed = self
            .next_of(last_lt, 0)
            .filter(|&id| {
                self.storage
                    .get(id)
                    .is_some_and(|node| self.comparator.compare(node.key(), key) == Ordering::Equal)
            })
            .and_then(|id| self.unlink(id, &update));
        self.update = update;
        removed.map(SkipNode::into_inner)
    }

    /// Find the node whose key compares equal to `key`.
    fn find_key(&self, key: &K) -> Option<NodeId> {
        let last_lt = self.descend(
            |node| self.comparator.compare(node.key(), key) == Ordering::Less,
            &mut [],
        );
        let candidate = self.next_of(last_lt, 0)?;
        let node = self.storage.get(candidate)?;
        (self.comparator.compare(node.key(), key) == Ordering::Equal).then_some(candidate)
    }
}

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    /// Clears the skipdict, removing all entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// dict.clear();
    /// assert!(dict.is_empty());
    /// ```
    pub fn clear(&mut self) {
        // Walk the bottom level only; it holds every node exactly once.
        let mut cursor = self.head.first().copied().flatten();
        while let Some(id) = cursor {
            cursor = self.storage.remove(id).and_then(|node| node.next(0));
        }
        self.head.fill(None);
        self.highest = 0;
        self.len = 0;
    }

    /// Returns the number of entries in the skipdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// assert_eq!(dict.len(), 10);
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the skipdict contains no entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// assert!(dict.is_empty());
    ///
    /// dict.insert(1, "Rust")?;
    /// assert!(!dict.is_empty());
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Provides a reference to the entry with the smallest key, or `None` if
    /// the skipdict is empty.  This is `O(1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// assert!(dict.front().is_none());
    ///
    /// dict.insert(2, "World")?;
    /// dict.insert(1, "Hello")?;
    /// assert_eq!(dict.front(), Some((&1, &"Hello")));
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    pub fn front(&self) -> Option<(&K, &V)> {
        let first = self.next_of(None, 0)?;
        self.storage.get(first).map(SkipNode::item_ref)
    }

    /// Provides a reference to the entry with the largest key, or `None` if
    /// the skipdict is empty.  This is `O(log(n))` on average.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// assert!(dict.back().is_none());
    ///
    /// dict.insert(2, "World")?;
    /// dict.insert(1, "Hello")?;
    /// assert_eq!(dict.back(), Some((&2, &"World")));
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    #[inline]
    pub fn back(&self) -> Option<(&K, &V)> {
        let last = self.last_node()?;
        self.storage.get(last).map(SkipNode::item_ref)
    }

    /// Removes the entry with the smallest key and returns it, or `None` if
    /// the skipdict is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// dict.insert(1, "Hello")?;
    /// dict.insert(2, "World")?;
    ///
    /// assert_eq!(dict.pop_front(), Some((1, "Hello")));
    /// assert_eq!(dict.pop_front(), Some((2, "World")));
    /// assert!(dict.pop_front().is_none());
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let first = self.next_of(None, 0)?;
        // The head precedes the first node on every level it reaches.
        self.unlink(first, &[]).map(SkipNode::into_inner)
    }

    /// Removes the entry with the largest key and returns it, or `None` if
    /// the skipdict is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let mut dict = SkipDict::new();
    /// dict.insert(1, "Hello")?;
    /// dict.insert(2, "World")?;
    ///
    /// assert_eq!(dict.pop_back(), Some((2, "World")));
    /// assert_eq!(dict.pop_back(), Some((1, "Hello")));
    /// assert!(dict.pop_back().is_none());
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        if self.is_empty() {
            return None;
        }
        let mut update = mem::take(&mut self.update);
        // Stop short of the last node on every level.
        let penultimate = self.descend(|node| node.next(0).is_some(), &mut update);
        let removed = self
            .next_of(penultimate, 0)
            .and_then(|last| self.unlink(last, &update));
        self.update = update;
        removed.map(SkipNode::into_inner)
    }

    /// Calls `visit` on every entry in ascending key order, stopping at the
    /// first [`ControlFlow::Break`] and returning it.  If every entry was
    /// visited, returns [`ControlFlow::Continue`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::ControlFlow;
    ///
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x * x)).collect();
    /// let first_big = dict.visit(|k, v| {
    ///     if *v > 20 { ControlFlow::Break(*k) } else { ControlFlow::Continue(()) }
    /// });
    /// assert_eq!(first_big, ControlFlow::Break(5));
    /// ```
    #[inline]
    pub fn visit<B>(&self, mut visit: impl FnMut(&K, &V) -> ControlFlow<B>) -> ControlFlow<B> {
        self.iter().try_for_each(|(key, value)| visit(key, value))
    }

    /// Creates an iterator over the entries of the skipdict, in ascending key
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// for (k, v) in dict.iter() {
    ///     println!("Key: {}, Value: {}", k, v);
    /// }
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            storage: &self.storage,
            first: self.next_of(None, 0),
            last: self.last_node(),
            size: self.len,
            _marker: PhantomData,
        }
    }

    /// Creates an iterator over the keys of the skipdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// for k in dict.keys() {
    ///     println!("Key: {}", k);
    /// }
    /// ```
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys(self.iter())
    }

    /// Creates an iterator over the values of the skipdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::SkipDict;
    ///
    /// let dict: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
    /// for v in dict.values() {
    ///     println!("Value: {}", v);
    /// }
    /// ```
    #[inline]
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values(self.iter())
    }

    /// Renders the internal levels of the skipdict, top level first, for
    /// debugging purposes.
    ///
    /// Each line lists the keys in order; a key which does not reach the line's
    /// level is replaced by dashes.
    ///
    /// # Examples
    ///
    /// ```
    /// use skipdict::{Arena, FromFn, Natural, SkipDict};
    ///
    /// let levels = FromFn::new(4, |key: &u8| usize::from(*key == 2))?;
    /// let mut dict = SkipDict::with_parts(Natural, levels, Arena::new())?;
    /// dict.extend([(1_u8, ()), (2, ()), (3, ())]);
    /// assert_eq!(dict.debug_structure(), "L1 head - 2 -\nL0 head 1 2 3");
    /// # Ok::<(), skipdict::Error>(())
    /// ```
    pub fn debug_structure(&self) -> String
    where
        K: fmt::Debug,
    {
        let cells: Vec<(String, usize)> = iter::successors(self.next_of(None, 0), |&id| {
            self.next_of(Some(id), 0)
        })
        .filter_map(|id| self.storage.get(id))
        .map(|node| (format!("{:?}", node.key()), node.level()))
        .collect();

        let mut rows = Vec::with_capacity(self.highest);
        for level in (0..self.highest).rev() {
            let mut row = format!("L{level} head");
            for (key, node_level) in &cells {
                row.push(' ');
                if *node_level >= level {
                    row.push_str(key);
                } else {
                    row.extend(iter::repeat_n('-', key.chars().count()));
                }
            }
            rows.push(row);
        }
        rows.join("\n")
    }
}

// ///////////////////////////////////////////////
// Internal methods
// ///////////////////////////////////////////////

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    /// The next node after `cursor` at `level`, where a `None` cursor stands
    /// for the head.
    #[inline]
    fn next_of(&self, cursor: Option<NodeId>, level: usize) -> Option<NodeId> {
        match cursor {
            None => self.head.get(level).copied().flatten(),
            Some(id) => self.storage.get(id).and_then(|node| node.next(level)),
        }
    }

    /// Point the link of `cursor` (`None` being the head) at `level` to
    /// `next`.
    #[inline]
    fn set_next_of(&mut self, cursor: Option<NodeId>, level: usize, next: Option<NodeId>) {
        match cursor {
            None => {
                if let Some(link) = self.head.get_mut(level) {
                    *link = next;
                }
            }
            Some(id) => {
                if let Some(node) = self.storage.get_mut(id) {
                    node.set_next(level, next);
                }
            }
        }
    }

    /// Keep moving at the specified level as long as `pred` holds for the next
    /// node, returning where the walk stopped.
    fn advance_while_at_level(
        &self,
        mut cursor: Option<NodeId>,
        level: usize,
        mut pred: impl FnMut(&SkipNode<K, V>) -> bool,
    ) -> Option<NodeId> {
        while let Some(next) = self.next_of(cursor, level) {
            match self.storage.get(next) {
                Some(node) if pred(node) => cursor = Some(next),
                _ => break,
            }
        }
        cursor
    }

    /// Walk down from the highest active level to level 0, advancing on each
    /// level while `pred` holds for the next node.
    ///
    /// The node where each level's walk stopped is recorded in `update` (when
    /// it is long enough), and the level-0 stop is returned.  `None` stands for
    /// the head throughout.
    fn descend(
        &self,
        mut pred: impl FnMut(&SkipNode<K, V>) -> bool,
        update: &mut [Option<NodeId>],
    ) -> Option<NodeId> {
        let mut cursor = None;
        for level in (0..self.highest).rev() {
            cursor = self.advance_while_at_level(cursor, level, &mut pred);
            if let Some(slot) = update.get_mut(level) {
                *slot = cursor;
            }
        }
        cursor
    }

    /// The last node of the list, found by always taking the furthest link
    /// available.
    #[inline]
    fn last_node(&self) -> Option<NodeId> {
        self.descend(|_| true, &mut [])
    }

    /// Detach `id` from every level it takes part in and free it.
    ///
    /// `update[i]` must be the predecessor of `id` on level `i`; missing slots
    /// stand for the head.
    fn unlink(&mut self, id: NodeId, update: &[Option<NodeId>]) -> Option<SkipNode<K, V>> {
        let node = self.storage.remove(id)?;
        for level in 0..=node.level() {
            let before = update.get(level).copied().flatten();
            if self.next_of(before, level) != Some(id) {
                break;
            }
            self.set_next_of(before, level, node.next(level));
        }
        if let Some(next) = node.next(0) {
            if let Some(next) = self.storage.get_mut(next) {
                next.set_prev(node.prev());
            }
        }

        let highest = self.highest;
        while self.highest > 0 && self.next_of(None, self.highest - 1).is_none() {
            self.highest -= 1;
        }
        if self.highest != highest {
            trace!(from = highest, to = self.highest, "shrinking active levels");
        }

        self.len -= 1;
        Some(node)
    }
}

impl<K, V, C, L, S> SkipDict<K, V, C, L, S>
where
    C: Comparator<K>,
    S: Storage<SkipNode<K, V>>,
{
    /// Checks the integrity of the skipdict.
    #[cfg(test)]
    #[expect(clippy::panic, reason = "integrity checks are for tests")]
    fn check(&self) {
        let nodes: Vec<NodeId> =
            iter::successors(self.next_of(None, 0), |&id| self.next_of(Some(id), 0)).collect();
        assert_eq!(nodes.len(), self.len, "level 0 holds every node");
        assert_eq!(self.storage.len(), self.len, "storage holds every node");

        let mut prev = None;
        for &id in &nodes {
            let Some(node) = self.storage.get(id) else {
                panic!("dangling link to {id}");
            };
            assert_eq!(node.prev(), prev, "back link of {id}");
            prev = Some(id);
        }

        let highest = nodes
            .iter()
            .filter_map(|&id| self.storage.get(id))
            .map(|node| node.level() + 1)
            .max()
            .unwrap_or(0);
        assert_eq!(self.highest, highest, "highest active level");

        for level in 0..self.head.len() {
            let chain: Vec<NodeId> = iter::successors(self.next_of(None, level), |&id| {
                self.next_of(Some(id), level)
            })
            .collect();
            let expected: Vec<NodeId> = nodes
                .iter()
                .copied()
                .filter(|&id| self.storage.get(id).is_some_and(|node| node.level() >= level))
                .collect();
            assert_eq!(chain, expected, "nodes on level {level}");
            for pair in chain.windows(2) {
                if let &[a, b] = pair {
                    let (Some(a), Some(b)) = (self.storage.get(a), self.storage.get(b)) else {
                        panic!("dangling link on level {level}");
                    };
                    assert_eq!(
                        self.comparator.compare(a.key(), b.key()),
                        Ordering::Less,
                        "keys on level {level} are strictly increasing"
                    );
                }
            }
        }
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

impl<K, V, C, L, S> Drop for SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    #[inline]
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Default for SkipDict<K, V> {
    #[inline]
    fn default() -> SkipDict<K, V> {
        SkipDict::new()
    }
}

/// This implementation of PartialEq only checks that the *entries* are equal;
/// it does not check for equivalence of other features (such as the ordering
/// function and the node levels). Furthermore, this uses `K`'s implementation
/// of PartialEq and *does not* use the owning skipdict's comparison function.
impl<AK, AV, AC, AL, AS, BK, BV, BC, BL, BS> PartialEq<SkipDict<BK, BV, BC, BL, BS>>
    for SkipDict<AK, AV, AC, AL, AS>
where
    AK: PartialEq<BK>,
    AV: PartialEq<BV>,
    AS: Storage<SkipNode<AK, AV>>,
    BS: Storage<SkipNode<BK, BV>>,
{
    #[inline]
    fn eq(&self, other: &SkipDict<BK, BV, BC, BL, BS>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(x, y)| x.0 == y.0 && x.1 == y.1)
    }
}

impl<K, V, C, L, S> Eq for SkipDict<K, V, C, L, S>
where
    K: Eq,
    V: Eq,
    S: Storage<SkipNode<K, V>>,
{
}

impl<K, V, C, L, S> Extend<(K, V)> for SkipDict<K, V, C, L, S>
where
    C: Comparator<K>,
    L: LevelGenerator<K>,
    S: Storage<SkipNode<K, V>>,
{
    /// # Panics
    ///
    /// Panics if the storage fails to allocate a node, just as the standard
    /// collections abort when memory runs out.
    #[inline]
    #[expect(clippy::panic, reason = "Extend cannot report failures")]
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iterable: I) {
        for (key, value) in iterable {
            if let Err(err) = self.insert(key, value) {
                panic!("failed to extend skipdict: {err}");
            }
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SkipDict<K, V> {
    #[inline]
    fn from_iter<I>(iter: I) -> SkipDict<K, V>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut dict = SkipDict::new();
        dict.extend(iter);
        dict
    }
}

impl<K, V, C, L, S> fmt::Debug for SkipDict<K, V, C, L, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
    S: Storage<SkipNode<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (i, (k, v)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "({k:?}, {v:?})")?;
        }
        write!(f, "]")
    }
}

impl<K, V, C, L, S> fmt::Display for SkipDict<K, V, C, L, S>
where
    K: fmt::Display,
    V: fmt::Display,
    S: Storage<SkipNode<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (i, (k, v)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "({k}, {v})")?;
        }
        write!(f, "]")
    }
}

impl<K: Hash, V: Hash, C, L, S> Hash for SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    #[inline]
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<K, V, C, L, S> IntoIterator for SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C, L, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

impl<'a, K, V, C, L, S> IntoIterator for &'a SkipDict<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ///////////////////////////////////////////////
// Extra structs
// ///////////////////////////////////////////////

/// An iterator over the entries of a [`SkipDict`], in ascending key order.
pub struct Iter<'a, K, V, S> {
    storage: &'a S,
    first: Option<NodeId>,
    last: Option<NodeId>,
    size: usize,
    _marker: PhantomData<&'a SkipNode<K, V>>,
}

impl<'a, K: 'a, V: 'a, S> Iterator for Iter<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 {
            return None;
        }
        let node = self.storage.get(self.first?)?;
        self.first = node.next(0);
        self.size -= 1;
        Some(node.item_ref())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}

impl<'a, K: 'a, V: 'a, S> DoubleEndedIterator for Iter<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.size == 0 {
            return None;
        }
        let node = self.storage.get(self.last?)?;
        self.last = node.prev();
        self.size -= 1;
        Some(node.item_ref())
    }
}

impl<'a, K: 'a, V: 'a, S> ExactSizeIterator for Iter<'a, K, V, S> where S: Storage<SkipNode<K, V>> {}

/// Iterator over a [`SkipDict`]'s keys.
pub struct Keys<'a, K, V, S>(Iter<'a, K, V, S>);

impl<'a, K: 'a, V: 'a, S> Iterator for Keys<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|x| x.0)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K: 'a, V: 'a, S> DoubleEndedIterator for Keys<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|x| x.0)
    }
}

/// Iterator over a [`SkipDict`]'s values.
pub struct Values<'a, K, V, S>(Iter<'a, K, V, S>);

impl<'a, K: 'a, V: 'a, S> Iterator for Values<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|x| x.1)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K: 'a, V: 'a, S> DoubleEndedIterator for Values<'a, K, V, S>
where
    S: Storage<SkipNode<K, V>>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|x| x.1)
    }
}

/// Consuming iterator over the entries of a [`SkipDict`].
pub struct IntoIter<K, V, C, L, S>(SkipDict<K, V, C, L, S>)
where
    S: Storage<SkipNode<K, V>>;

impl<K, V, C, L, S> Iterator for IntoIter<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<K, V, C, L, S> DoubleEndedIterator for IntoIter<K, V, C, L, S>
where
    S: Storage<SkipNode<K, V>>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.pop_back()
    }
}

impl<K, V, C, L, S> ExactSizeIterator for IntoIter<K, V, C, L, S> where S: Storage<SkipNode<K, V>> {}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        hash::{BuildHasher, RandomState},
        ops::ControlFlow,
        rc::Rc,
    };

    use anyhow::Result;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::SkipDict;
    use crate::{
        Arena, Error, FromFn, Geometric, LevelGenerator, LevelGeneratorError, Natural, NodeId,
        Rejected, SkipNode, Storage, StorageError, Uniform,
    };

    /// Arena which keeps count of allocations and frees.
    struct Counting<T> {
        inner: Arena<T>,
        allocs: Rc<Cell<usize>>,
        frees: Rc<Cell<usize>>,
    }

    impl<T> Storage<T> for Counting<T> {
        fn try_insert(&mut self, value: T) -> Result<NodeId, Rejected<T>> {
            let id = self.inner.try_insert(value)?;
            self.allocs.set(self.allocs.get() + 1);
            Ok(id)
        }

        fn remove(&mut self, id: NodeId) -> Option<T> {
            let value = self.inner.remove(id);
            if value.is_some() {
                self.frees.set(self.frees.get() + 1);
            }
            value
        }

        fn get(&self, id: NodeId) -> Option<&T> {
            self.inner.get(id)
        }

        fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
            self.inner.get_mut(id)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    type CountingDict =
        SkipDict<u64, &'static str, Natural, Uniform, Counting<SkipNode<u64, &'static str>>>;

    fn counting() -> (CountingDict, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let allocs = Rc::new(Cell::new(0));
        let frees = Rc::new(Cell::new(0));
        let storage = Counting {
            inner: Arena::new(),
            allocs: Rc::clone(&allocs),
            frees: Rc::clone(&frees),
        };
        let dict = SkipDict::with_parts(Natural, Uniform::default(), storage).unwrap();
        (dict, allocs, frees)
    }

    #[test]
    fn basic_small() -> Result<()> {
        let mut sd: SkipDict<i64, i64> = SkipDict::new();
        sd.check();
        assert!(sd.remove(&1).is_none());
        sd.check();
        assert!(sd.insert(1, 0)?.is_none());
        sd.check();
        assert_eq!(sd.insert(1, 5)?, Some(0));
        sd.check();
        assert_eq!(sd.remove(&1), Some(5));
        sd.check();
        assert!(sd.insert(1, 10)?.is_none());
        sd.check();
        assert!(sd.insert(2, 20)?.is_none());
        sd.check();
        assert_eq!(sd.remove(&1), Some(10));
        sd.check();
        assert_eq!(sd.remove(&2), Some(20));
        sd.check();
        assert!(sd.remove(&1).is_none());
        sd.check();
        Ok(())
    }

    #[test]
    fn basic_large() -> Result<()> {
        let size = 10_000;
        let mut sd = SkipDict::with_capacity(size);
        assert!(sd.is_empty());

        for i in 0..size {
            sd.insert(i, i * 10)?;
            assert_eq!(sd.len(), i + 1);
        }
        sd.check();

        for i in 0..size {
            assert_eq!(sd.remove(&i), Some(i * 10));
            assert_eq!(sd.len(), size - i - 1);
        }
        sd.check();
        Ok(())
    }

    #[test]
    fn insert_existing() -> Result<()> {
        let size = 100;
        let mut sd = SkipDict::new();

        for i in 0..size {
            assert!(sd.insert(i, format!("{i}"))?.is_none());
        }

        for i in 0..size {
            assert_eq!(sd.insert(i, format!("{i}"))?, Some(format!("{i}")));
        }
        for i in (0..size).rev() {
            assert_eq!(sd.insert(i, format!("{i}"))?, Some(format!("{i}")));
        }
        assert_eq!(sd.len(), size);
        sd.check();
        Ok(())
    }

    #[test]
    fn unordered_inserts() -> Result<()> {
        let mut sd = SkipDict::new();
        sd.insert(5, "e")?;
        sd.insert(1, "a")?;
        sd.insert(3, "c")?;
        sd.check();

        assert_eq!(sd.front(), Some((&1, &"a")));
        assert_eq!(sd.back(), Some((&5, &"e")));
        assert_eq!(sd.iter().collect::<Vec<_>>(), [(&1, &"a"), (&3, &"c"), (&5, &"e")]);

        assert_eq!(sd.remove(&3), Some("c"));
        sd.check();
        assert_eq!(sd.get(&3), None);
        assert_eq!(sd.len(), 2);
        Ok(())
    }

    #[test]
    fn empty() {
        let (mut sd, allocs, frees) = counting();
        assert_eq!(sd.front(), None);
        assert_eq!(sd.back(), None);
        assert_eq!(sd.pop_front(), None);
        assert_eq!(sd.pop_back(), None);
        assert_eq!(sd.remove(&0), None);
        assert_eq!(sd.get(&0), None);
        assert_eq!(sd.iter().next(), None);
        assert_eq!(sd.debug_structure(), "");
        sd.clear();
        sd.check();
        drop(sd);
        assert_eq!((allocs.get(), frees.get()), (0, 0));
    }

    #[test]
    fn overwrite_does_not_allocate() -> Result<()> {
        let (mut sd, allocs, frees) = counting();
        sd.insert(7, "a")?;
        assert_eq!(allocs.get(), 1);
        assert_eq!(sd.insert(7, "b")?, Some("a"));
        assert_eq!(allocs.get(), 1);
        assert_eq!(frees.get(), 0);
        assert_eq!(sd.get(&7), Some(&"b"));
        Ok(())
    }

    #[test]
    fn drop_frees_every_node() -> Result<()> {
        let (mut sd, allocs, frees) = counting();
        for i in 0..100 {
            sd.insert(i, "x")?;
        }
        sd.remove(&50);
        sd.pop_front();
        assert_eq!(frees.get(), 2);
        drop(sd);
        assert_eq!(allocs.get(), 100);
        assert_eq!(frees.get(), 100);
        Ok(())
    }

    #[test]
    fn storage_full() -> Result<()> {
        let levels = Uniform::with_seed(8, 7)?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::bounded(2))?;
        sd.insert(1, 'a')?;
        sd.insert(2, 'b')?;

        assert_eq!(
            sd.insert(3, 'c'),
            Err(Error::Storage(StorageError::Full { capacity: 2 }))
        );
        sd.check();
        assert_eq!(sd.len(), 2);
        assert!(!sd.contains_key(&3));

        // Overwriting needs no new node.
        assert_eq!(sd.insert(1, 'z')?, Some('a'));

        sd.remove(&2);
        assert_eq!(sd.insert(3, 'c')?, None);
        sd.check();
        assert_eq!(sd.keys().copied().collect::<Vec<_>>(), [1, 3]);
        Ok(())
    }

    #[test]
    fn zero_levels() {
        let levels = FromFn::new(1, |_: &u8| 0).unwrap();
        assert!(SkipDict::<u8, (), _, _>::with_parts(Natural, levels, Arena::new()).is_ok());

        struct Flat;
        impl LevelGenerator<u8> for Flat {
            fn total(&self) -> usize {
                0
            }
            fn level(&mut self, _key: &u8) -> usize {
                0
            }
        }
        assert_eq!(
            SkipDict::<u8, (), _, _>::with_parts(Natural, Flat, Arena::new()).err(),
            Some(Error::LevelGenerator(LevelGeneratorError::ZeroMax))
        );
    }

    #[test]
    fn head_allocation_failure() {
        struct Endless;
        impl LevelGenerator<u8> for Endless {
            fn total(&self) -> usize {
                usize::MAX
            }
            fn level(&mut self, _key: &u8) -> usize {
                0
            }
        }
        let result = SkipDict::<u8, (), _, _>::with_parts(Natural, Endless, Arena::new());
        assert!(matches!(
            result.err(),
            Some(Error::Storage(StorageError::Alloc(_)))
        ));
    }

    #[test]
    fn storage_full_returns_entry() -> Result<()> {
        let (mut sd, allocs, frees) = counting();
        sd.storage.inner = Arena::bounded(1);
        sd.insert(1, "one")?;

        let err = sd.try_insert(2, "two").unwrap_err();
        assert_eq!(err.key(), &2);
        assert_eq!(err.error(), &Error::Storage(StorageError::Full { capacity: 1 }));
        assert_eq!(err.into_entry(), (2, "two"));
        assert_eq!(sd.len(), 1);
        sd.check();

        // Overwrites still go through on a full storage.
        assert_eq!(sd.try_insert(1, "uno").ok(), Some(Some("one")));
        assert_eq!((allocs.get(), frees.get()), (1, 0));

        let mut owned = SkipDict::with_parts(Natural, Uniform::default(), Arena::bounded(0))?;
        let err = owned.try_insert(String::from("key"), vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.into_entry(), (String::from("key"), vec![1, 2, 3]));
        assert!(owned.is_empty());
        Ok(())
    }

    #[test]
    fn pop() -> Result<()> {
        let mut sd: SkipDict<_, _> = (0..100).map(|x| (x, x * 2)).collect();

        for i in 0..25 {
            assert_eq!(sd.pop_front(), Some((i, i * 2)));
            assert_eq!(sd.pop_back(), Some((99 - i, (99 - i) * 2)));
            sd.check();
        }
        assert_eq!(sd.len(), 50);
        assert_eq!(sd.front(), Some((&25, &50)));
        assert_eq!(sd.back(), Some((&74, &148)));

        while sd.pop_back().is_some() {}
        sd.check();
        assert!(sd.is_empty());
        assert_eq!(sd.highest, 0);
        Ok(())
    }

    #[test]
    fn highest_follows_levels() -> Result<()> {
        let levels = FromFn::new(8, |key: &usize| *key)?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::new())?;
        sd.extend((0..4).map(|k| (k, ())));
        assert_eq!(sd.highest, 4);

        sd.remove(&3);
        assert_eq!(sd.highest, 3);
        sd.pop_back();
        assert_eq!(sd.highest, 2);
        sd.pop_front();
        assert_eq!(sd.highest, 2);
        sd.check();
        sd.pop_front();
        assert_eq!(sd.highest, 0);
        sd.check();

        // Overwrites leave the levels alone.
        sd.insert(1, ())?;
        sd.insert(1, ())?;
        assert_eq!(sd.highest, 2);
        Ok(())
    }

    #[test]
    fn out_of_range_levels_are_clamped() -> Result<()> {
        let levels = FromFn::new(4, |_: &i32| 10)?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::new())?;
        sd.extend([(2, 'b'), (1, 'a')]);
        sd.check();
        assert_eq!(sd.highest, 4);
        assert_eq!(sd.debug_structure().lines().count(), 4);
        assert_eq!(sd.get(&1), Some(&'a'));
        Ok(())
    }

    #[rstest]
    fn key_dependent_levels(#[values(1, 3, 12)] total: usize) -> Result<()> {
        let levels = FromFn::new(total, |key: &u32| key.trailing_zeros() as usize)?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::new())?;
        sd.extend((1..=64_u32).map(|k| (k, k)));
        sd.check();
        assert_eq!(sd.highest, total.min(7));
        for k in (1..=64).step_by(3) {
            assert_eq!(sd.remove(&k), Some(k));
        }
        sd.check();
        Ok(())
    }

    #[test]
    fn geometric_levels() -> Result<()> {
        let levels = Geometric::with_seed(16, 0.5, 1)?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::new())?;
        sd.extend((0..1_000).rev().map(|k| (k, -k)));
        sd.check();
        assert_eq!(sd.get(&500), Some(&-500));
        assert_eq!(sd.values().next(), Some(&0));
        Ok(())
    }

    #[test]
    fn reverse_comparator() -> Result<()> {
        let mut sd = SkipDict::with_comparator(|a: &u64, b: &u64| b.cmp(a));
        for k in [4, 8, 1, 6] {
            sd.insert(k, k.to_string())?;
        }
        sd.check();
        assert_eq!(sd.keys().copied().collect::<Vec<_>>(), [8, 6, 4, 1]);
        assert_eq!(sd.front(), Some((&8, &String::from("8"))));
        assert_eq!(sd.pop_back(), Some((1, String::from("1"))));
        assert_eq!(sd.remove_entry(&6), Some((6, String::from("6"))));
        sd.check();
        Ok(())
    }

    #[test]
    fn comparator_decides_equality() -> Result<()> {
        let mut sd = SkipDict::with_comparator(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));
        sd.insert(-2, "neg")?;
        assert_eq!(sd.insert(2, "pos")?, Some("neg"));
        assert_eq!(sd.len(), 1);
        // The first key is kept.
        assert_eq!(sd.front(), Some((&-2, &"pos")));
        assert_eq!(sd.get(&2), Some(&"pos"));
        Ok(())
    }

    #[test]
    fn get_mut_and_get_or() {
        let mut sd: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
        if let Some(v) = sd.get_mut(&3) {
            *v = 30;
        }
        assert!(sd.get_mut(&10).is_none());
        assert_eq!(sd.get(&3), Some(&30));
        assert_eq!(sd.get_or(&3, &-1), &30);
        assert_eq!(sd.get_or(&11, &-1), &-1);
    }

    #[test]
    fn clear() {
        let mut sd: SkipDict<_, _> = (0..100).map(|x| (x, x)).collect();
        assert_eq!(sd.len(), 100);
        sd.clear();
        sd.check();
        assert!(sd.is_empty());
        sd.extend([(1, 1)]);
        sd.check();
    }

    #[test]
    fn iter() {
        let size = 10000;

        let sd: SkipDict<_, _> = (0..size).map(|x| (x, x)).collect();

        fn test<T>(size: usize, mut iter: T)
        where
            T: Iterator<Item = (usize, usize)>,
        {
            for i in 0..size {
                assert_eq!(iter.size_hint(), (size - i, Some(size - i)));
                assert_eq!(iter.next().unwrap(), (i, i));
            }
            assert_eq!(iter.size_hint(), (0, Some(0)));
            assert!(iter.next().is_none());
        }
        test(size, sd.iter().map(|(&a, &b)| (a, b)));
        test(size, (&sd).into_iter().map(|(&a, &b)| (a, b)));
        test(size, sd.into_iter());
    }

    #[test]
    fn iter_rev() {
        let size = 1000;

        let sd: SkipDict<_, _> = (0..size).map(|x| (x, x)).collect();

        fn test<T>(size: usize, mut iter: T)
        where
            T: Iterator<Item = (usize, usize)>,
        {
            for i in 0..size {
                assert_eq!(iter.size_hint(), (size - i, Some(size - i)));
                assert_eq!(iter.next().unwrap(), (size - i - 1, size - i - 1));
            }
            assert_eq!(iter.size_hint(), (0, Some(0)));
            assert!(iter.next().is_none());
        }
        test(size, sd.iter().rev().map(|(&a, &b)| (a, b)));
        test(size, sd.into_iter().rev());
    }

    #[test]
    fn iter_mixed() {
        let size = 1000;
        let sd: SkipDict<_, _> = (0..size).map(|x| (x, x)).collect();

        fn test<T>(size: usize, mut iter: T)
        where
            T: Iterator<Item = (usize, usize)> + DoubleEndedIterator,
        {
            for i in 0..size / 4 {
                assert_eq!(iter.size_hint(), (size - i * 2, Some(size - i * 2)));
                assert_eq!(iter.next().unwrap(), (i, i));
                assert_eq!(iter.next_back().unwrap(), (size - i - 1, size - i - 1));
            }
            for i in size / 4..size * 3 / 4 {
                assert_eq!(iter.size_hint(), (size * 3 / 4 - i, Some(size * 3 / 4 - i)));
                assert_eq!(iter.next().unwrap(), (i, i));
            }
            assert_eq!(iter.size_hint(), (0, Some(0)));
            assert!(iter.next().is_none());
            assert!(iter.next_back().is_none());
        }
        test(size, sd.iter().map(|(&a, &b)| (a, b)));
        test(size, sd.into_iter());
    }

    #[test]
    fn iter_key_val() {
        let size = 1000;
        let sd: SkipDict<_, _> = (0..size).map(|x| (x, 2 * x)).collect();

        let mut keys = sd.keys();
        for i in 0..size {
            assert_eq!(keys.size_hint(), (size - i, Some(size - i)));
            assert_eq!(*keys.next().unwrap(), i);
        }
        assert!(keys.next().is_none());

        let mut vals = sd.values().rev();
        for i in (0..size).rev() {
            assert_eq!(*vals.next().unwrap(), 2 * i);
        }
        assert!(vals.next().is_none());
    }

    #[test]
    fn visit() {
        let sd: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();

        let mut seen = Vec::new();
        let result = sd.visit(|k, _| {
            seen.push(*k);
            if *k == 3 { ControlFlow::Break("stop") } else { ControlFlow::Continue(()) }
        });
        assert_eq!(result, ControlFlow::Break("stop"));
        assert_eq!(seen, [0, 1, 2, 3]);

        let mut sum = 0;
        let result: ControlFlow<()> = sd.visit(|_, v| {
            sum += v;
            ControlFlow::Continue(())
        });
        assert_eq!(result, ControlFlow::Continue(()));
        assert_eq!(sum, 45);
    }

    #[test]
    fn contains() {
        let (min, max) = (25, 75);
        let sd: SkipDict<_, _> = (min..max).map(|x| (x, x)).collect();

        for i in 0..100 {
            if i < min || i >= max {
                assert!(!sd.contains_key(&i));
            } else {
                assert!(sd.contains_key(&i));
            }
        }
    }

    #[test]
    fn debug_display() {
        let sd: SkipDict<_, _> = (0..3).map(|x| (x, x.to_string())).collect();
        assert_eq!(format!("{sd:?}"), r#"[(0, "0"), (1, "1"), (2, "2")]"#);
        assert_eq!(format!("{sd}"), "[(0, 0), (1, 1), (2, 2)]");
        assert_eq!(SkipDict::<u8, u8>::new().to_string(), "[]");
    }

    #[test]
    fn debug_structure() -> Result<()> {
        let levels = FromFn::new(4, |key: &u32| match key {
            3 => 2,
            5 => 1,
            10 => 3,
            _ => 0,
        })?;
        let mut sd = SkipDict::with_parts(Natural, levels, Arena::new())?;
        sd.extend([(5, ()), (1, ()), (3, ())]);
        assert_snapshot!(sd.debug_structure(), @r"
        L2 head - 3 -
        L1 head - 3 5
        L0 head 1 3 5
        ");

        sd.insert(10, ())?;
        sd.remove(&3);
        assert_snapshot!(sd.debug_structure(), @r"
        L3 head - - 10
        L2 head - - 10
        L1 head - 5 10
        L0 head 1 5 10
        ");
        Ok(())
    }

    #[test]
    fn equality() {
        let a: SkipDict<i64, i64> = (0..100).map(|x| (x, x)).collect();
        let b: SkipDict<i64, i64> = (0..100).map(|x| (x, x)).collect();
        let c: SkipDict<i64, i64> = (0..10).map(|x| (x, x)).collect();
        let d: SkipDict<i64, i64> = (100..200).map(|x| (x, x)).collect();
        let e: SkipDict<i64, i64> = (0..100).chain(0..1).map(|x| (x, x)).collect();

        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, e);
        assert_eq!(b, b);
        assert_eq!(b, e);
        assert_ne!(c, d);

        // Comparators are not part of equality.
        let mut f = SkipDict::with_comparator(|x: &i64, y: &i64| x.cmp(y));
        f.extend((0..100).rev().map(|x| (x, x)));
        assert!(a == f);
    }

    #[test]
    fn hash() {
        let state = RandomState::new();
        let a: SkipDict<_, _> = (0..10).map(|x| (x, x)).collect();
        let b: SkipDict<_, _> = (0..10).rev().map(|x| (x, x)).collect();
        let c: SkipDict<_, _> = (0..11).map(|x| (x, x)).collect();
        assert_eq!(state.hash_one(&a), state.hash_one(&b));
        assert_ne!(state.hash_one(&a), state.hash_one(&c));
    }
}
