//! # prefix-index
//!
//! A concurrent prefix-search index mapping string keys to sets of integer
//! ids, built for autocomplete over a user directory.
//!
//! [`PrefixTrie`] is the plain data structure. [`PrefixIndex`] shares one
//! behind a single reader/writer lock: inserts and removals (pruning
//! included) run under the write lock, searches under the read lock.
//! [`DirectoryIndex`] derives search tokens from user profiles and keeps the
//! index in step with profile changes.
//!
//! ## Example
//!
//! ```rust
//! use prefix_index::PrefixIndex;
//!
//! let index: PrefixIndex = PrefixIndex::new();
//! index.insert("go", 1);
//! index.insert("gob", 3);
//! index.insert("goal", 5);
//! index.insert("go", 4);
//!
//! assert_eq!(index.size(), 4);
//! assert_eq!(index.find("go", 10), vec![1, 4, 5, 3]);
//!
//! index.remove("gob", 3);
//! assert_eq!(index.find("go", 10), vec![1, 4, 5]);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod directory;
mod trie;

pub use config::Config;
pub use directory::{DirectoryError, DirectoryIndex, LoadError, Profile, ProfileUpdate, UserId};
pub use trie::PrefixTrie;

use std::fmt::Debug;

use parking_lot::RwLock;
use tracing::trace;

/// A prefix index safe for concurrent use.
///
/// All state sits behind one lock scoped to the whole index. A writer holds
/// it for the complete tree edit, so readers never observe a half-inserted
/// value or a branch detached mid-prune. No I/O happens under the lock.
///
/// Share it across threads with `Arc<PrefixIndex<V>>`.
#[derive(Debug)]
pub struct PrefixIndex<V = i64> {
    inner: RwLock<PrefixTrie<V>>,
    config: Config,
}

impl<V> PrefixIndex<V>
where
    V: Copy + Ord + Debug,
{
    /// Create a new empty index with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new empty index with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(PrefixTrie::with_capacity(config.initial_capacity)),
            config,
        }
    }

    /// Wrap an already-built trie, e.g. one bulk-loaded before going live.
    pub fn from_trie(trie: PrefixTrie<V>, config: Config) -> Self {
        Self {
            inner: RwLock::new(trie),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Associate `id` with `key`.
    ///
    /// Returns `true` if the pair was new; re-inserting a stored pair leaves
    /// [`size`](Self::size) unchanged. An empty key is a no-op.
    pub fn insert(&self, key: &str, id: V) -> bool {
        let added = self.inner.write().insert(key, id);
        trace!(key, ?id, added, "index insert");
        added
    }

    /// Dissociate `id` from `key` and prune the branch it leaves behind.
    ///
    /// Returns `true` if the pair was present. Absent pairs are a no-op.
    pub fn remove(&self, key: &str, id: V) -> bool {
        let pruned = self.inner.write().remove_and_prune(key, id);
        match pruned {
            Some(pruned) => {
                trace!(key, ?id, pruned, "index remove");
                true
            }
            None => {
                trace!(key, ?id, "index remove of absent pair");
                false
            }
        }
    }

    /// Up to `max` distinct ids stored under `prefix` or any key extending it.
    ///
    /// See [`PrefixTrie::find`] for the visiting order.
    pub fn find(&self, prefix: &str, max: usize) -> Vec<V> {
        self.inner.read().find(prefix, max)
    }

    /// [`find`](Self::find) limited to [`Config::max_results`].
    pub fn find_default(&self, prefix: &str) -> Vec<V> {
        self.find(prefix, self.config.max_results)
    }

    /// Number of distinct `(key, id)` pairs.
    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, key: &str, id: V) -> bool {
        self.inner.read().contains(key, id)
    }

    /// Live trie nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Insert every pair under a single write lock. Returns how many pairs
    /// were new.
    pub fn insert_many<I, K>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        let mut trie = self.inner.write();
        let mut added = 0;
        for (key, id) in pairs {
            if trie.insert(key.as_ref(), id) {
                added += 1;
            }
        }
        trace!(added, size = trie.len(), "index bulk insert");
        added
    }

    /// Run `f` with exclusive access to the trie.
    ///
    /// Readers see either none or all of the edits made by `f`.
    pub fn batch<R>(&self, f: impl FnOnce(&mut PrefixTrie<V>) -> R) -> R {
        let mut trie = self.inner.write();
        f(&mut trie)
    }

    /// Drop every pair.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn into_inner(self) -> PrefixTrie<V> {
        self.inner.into_inner()
    }
}

impl<V: Copy + Ord + Debug> Default for PrefixIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<str>, V: Copy + Ord + Debug> FromIterator<(K, V)> for PrefixIndex<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let config = Config::default();
        let mut trie = PrefixTrie::with_capacity(config.initial_capacity);
        trie.extend(pairs);
        Self::from_trie(trie, config)
    }
}
