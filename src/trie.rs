//! Arena-backed character trie mapping string keys to sets of ids.
//!
//! Every node lives in one `Vec` and refers to other nodes through a
//! [`NodeId`] handle. Children are owned through the parent's edge list; the
//! parent handle stored in each node is a back-reference only, used by
//! `remove` to walk upward and prune branches that no longer carry a value.
//! Released slots go onto a free list and are reused by later inserts.

use std::collections::BTreeSet;

use smallvec::SmallVec;

// =============================================================================
// Node handles and nodes
// =============================================================================

/// Index of a node inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    /// Edge label from the parent. `None` only for the root and released slots.
    pub(crate) ch: Option<char>,
    pub(crate) values: BTreeSet<V>,
    /// Outgoing edges, sorted by character.
    pub(crate) children: SmallVec<[(char, NodeId); 2]>,
    pub(crate) parent: Option<NodeId>,
}

impl<V> Node<V> {
    fn root() -> Self {
        Self {
            ch: None,
            values: BTreeSet::new(),
            children: SmallVec::new(),
            parent: None,
        }
    }

    fn new(ch: char, parent: NodeId) -> Self {
        Self {
            ch: Some(ch),
            values: BTreeSet::new(),
            children: SmallVec::new(),
            parent: Some(parent),
        }
    }

    /// `Ok(position)` of the edge labelled `ch`, or `Err(position)` where it
    /// would have to be inserted to keep the edges sorted.
    #[inline]
    fn edge(&self, ch: char) -> Result<usize, usize> {
        self.children.binary_search_by_key(&ch, |&(c, _)| c)
    }

    #[inline]
    fn child(&self, ch: char) -> Option<NodeId> {
        self.edge(ch).ok().map(|pos| self.children[pos].1)
    }

    fn detach(&mut self, ch: char) {
        if let Ok(pos) = self.edge(ch) {
            self.children.remove(pos);
        }
    }

    /// Neither terminates a key nor leads to one.
    #[inline]
    pub(crate) fn is_dead(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }
}

// =============================================================================
// Node arena
// =============================================================================

/// Owner of every node, with a free list of released slots.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<V> {
    nodes: Vec<Node<V>>,
    free: Vec<NodeId>,
}

impl<V> NodeArena<V> {
    fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Node::root());
        Self {
            nodes,
            free: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node<V> {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, node: Node<V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    fn release(&mut self, id: NodeId) {
        debug_assert_ne!(id, NodeId::ROOT, "the root is never released");
        let node = &mut self.nodes[id.index()];
        node.ch = None;
        node.parent = None;
        node.values = BTreeSet::new();
        node.children = SmallVec::new();
        self.free.push(id);
    }

    fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::root();
        self.free.clear();
    }

    fn shrink_to_fit(&mut self) {
        // Trailing free slots can be dropped outright.
        while self.nodes.len() > 1 {
            let last = NodeId(self.nodes.len() - 1);
            match self.free.iter().position(|&id| id == last) {
                Some(pos) => {
                    self.free.swap_remove(pos);
                    self.nodes.pop();
                }
                None => break,
            }
        }
        self.nodes.shrink_to_fit();
        self.free.shrink_to_fit();
    }
}

// =============================================================================
// PrefixTrie
// =============================================================================

/// Single-threaded prefix trie from string keys to sets of ids.
///
/// Keys are walked one `char` at a time; case folding or trimming is up to
/// the caller. The empty key is never stored. An id may sit under any number
/// of keys, but appears at most once in a single node's value set.
///
/// [`PrefixIndex`](crate::PrefixIndex) wraps this type behind a lock for
/// shared use.
#[derive(Clone, Debug)]
pub struct PrefixTrie<V> {
    nodes: NodeArena<V>,
    /// Distinct `(key, id)` pairs currently stored.
    count: usize,
}

impl<V: Copy + Ord> PrefixTrie<V> {
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Creates an empty trie with room for `capacity` nodes (root included).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            count: 0,
        }
    }

    /// Number of distinct `(key, id)` pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of live nodes, the root included. An empty trie has one.
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Associates `id` with `key`.
    ///
    /// Returns `true` if the pair was new. An empty key is ignored.
    pub fn insert(&mut self, key: &str, id: V) -> bool {
        if key.is_empty() {
            return false;
        }

        let mut current = NodeId::ROOT;
        for ch in key.chars() {
            let edge = self.nodes.get(current).edge(ch);
            current = match edge {
                Ok(pos) => self.nodes.get(current).children[pos].1,
                Err(pos) => {
                    let child = self.nodes.alloc(Node::new(ch, current));
                    self.nodes.get_mut(current).children.insert(pos, (ch, child));
                    child
                }
            };
        }

        let added = self.nodes.get_mut(current).values.insert(id);
        if added {
            self.count += 1;
        }
        added
    }

    /// Returns `true` if `id` is stored under exactly `key`.
    pub fn contains(&self, key: &str, id: V) -> bool {
        !key.is_empty()
            && self
                .locate(key)
                .is_some_and(|node| self.nodes.get(node).values.contains(&id))
    }

    /// Collects up to `max` distinct ids stored under `prefix` or any key
    /// extending it.
    ///
    /// The node reached by `prefix` is visited first, then its subtree in
    /// pre-order with children taken in ascending character order. Ids within
    /// one node come out in ascending order. The walk stops as soon as `max`
    /// ids have been collected, so the result is a truncation of that order.
    ///
    /// An empty trie, an empty prefix, `max == 0` or an unknown prefix all
    /// yield an empty vector.
    pub fn find(&self, prefix: &str, max: usize) -> Vec<V> {
        if self.count == 0 || prefix.is_empty() || max == 0 {
            return Vec::new();
        }
        let Some(start) = self.locate(prefix) else {
            return Vec::new();
        };

        let mut found = Vec::with_capacity(max.min(self.count));
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id);
            for &value in &node.values {
                if seen.insert(value) {
                    found.push(value);
                    if found.len() == max {
                        return found;
                    }
                }
            }
            // Reversed so the smallest character is popped next.
            stack.extend(node.children.iter().rev().map(|&(_, child)| child));
        }
        found
    }

    /// Dissociates `id` from `key`, pruning nodes left without purpose.
    ///
    /// Returns `true` if the pair was present.
    pub fn remove(&mut self, key: &str, id: V) -> bool {
        self.remove_and_prune(key, id).is_some()
    }

    /// Like [`remove`](Self::remove), but reports how many nodes were pruned.
    /// `None` means the pair was not stored.
    pub(crate) fn remove_and_prune(&mut self, key: &str, id: V) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        let terminal = self.locate(key)?;
        if !self.nodes.get_mut(terminal).values.remove(&id) {
            return None;
        }
        self.count -= 1;
        Some(self.prune(terminal))
    }

    /// Drops every pair and every node but the root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.count = 0;
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    fn locate(&self, key: &str) -> Option<NodeId> {
        key.chars()
            .try_fold(NodeId::ROOT, |current, ch| self.nodes.get(current).child(ch))
    }

    /// Walks up from `start`, detaching each node that has become dead, and
    /// stops at the first node still in use or at the root.
    fn prune(&mut self, start: NodeId) -> usize {
        let mut released = 0;
        let mut current = start;
        while current != NodeId::ROOT {
            let node = self.nodes.get(current);
            if !node.is_dead() {
                break;
            }
            let (Some(parent), Some(ch)) = (node.parent, node.ch) else {
                break;
            };
            self.nodes.get_mut(parent).detach(ch);
            self.nodes.release(current);
            released += 1;
            current = parent;
        }
        released
    }

    #[cfg(test)]
    pub(crate) fn arena(&self) -> &NodeArena<V> {
        &self.nodes
    }
}

impl<V: Copy + Ord> Default for PrefixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<str>, V: Copy + Ord> Extend<(K, V)> for PrefixTrie<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) {
        for (key, id) in pairs {
            self.insert(key.as_ref(), id);
        }
    }
}

impl<K: AsRef<str>, V: Copy + Ord> FromIterator<(K, V)> for PrefixTrie<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut trie = Self::new();
        trie.extend(pairs);
        trie
    }
}


#[cfg(test)]
mod proptests;
