//! The nodes making up a skipdict.

use std::mem;

use crate::storage::NodeId;

// ////////////////////////////////////////////////////////////////////////////
// SkipNode
// ////////////////////////////////////////////////////////////////////////////

/// SkipNodes make up the SkipDict.  Each one owns a key and its value and
/// lives in the dict's [`Storage`][crate::Storage], linked to its neighbours
/// by [`NodeId`].
///
/// The node has a `level` which corresponds to how 'high' the node reaches.
/// A node of `level` n has (n + 1) links to next nodes, one per level it takes
/// part in, each of which is `None` when the node is the last one on that
/// level.
///
/// Lastly, each node contains a link to the immediately previous node in case
/// one needs to walk the list backwards.  `None` there means the head.
#[derive(Clone, Debug)]
pub struct SkipNode<K, V> {
    key: K,
    value: V,
    // how high the node reaches.
    level: usize,
    // The immediately previous element.
    prev: Option<NodeId>,
    // Links to the next node at the respective level.  This vector *must* be
    // of length `self.level + 1`.
    links: Vec<Option<NodeId>>,
}

impl<K, V> SkipNode<K, V> {
    /// Create a new, unlinked node reaching up to `level`.
    pub(crate) fn new(key: K, value: V, level: usize) -> Self {
        SkipNode {
            key,
            value,
            level,
            prev: None,
            links: vec![None; level + 1],
        }
    }

    /// The key held by this node.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value held by this node.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The highest level this node takes part in.
    #[inline]
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Key and value as a pair of references.
    #[inline]
    pub(crate) fn item_ref(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    /// Consumes the node returning the entry it contains.
    #[inline]
    pub(crate) fn into_inner(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Swap in a new value, returning the old one.
    #[inline]
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }

    /// The next node at `level`, if the node reaches that level and is not
    /// the last one on it.
    #[inline]
    pub(crate) fn next(&self, level: usize) -> Option<NodeId> {
        self.links.get(level).copied().flatten()
    }

    /// Relink the node at `level`.  Levels above the node's own are ignored.
    #[inline]
    pub(crate) fn set_next(&mut self, level: usize, next: Option<NodeId>) {
        if let Some(link) = self.links.get_mut(level) {
            *link = next;
        }
    }

    #[inline]
    pub(crate) fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    #[inline]
    pub(crate) fn set_prev(&mut self, prev: Option<NodeId>) {
        self.prev = prev;
    }
}
