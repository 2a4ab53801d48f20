//! User-directory search on top of [`PrefixIndex`].
//!
//! A profile is indexed under one token per word of its first and last name
//! plus its handle, all lower-cased. The system of record stays elsewhere;
//! this layer only turns profile changes into index mutations and queries
//! into id lists.

use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Config, PrefixIndex, PrefixTrie};

/// Id of a user record in the system of record.
pub type UserId = i64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("update must change the first name or the last name")]
    EmptyUpdate,
}

/// A bulk load stopped at a record the source could not produce.
#[derive(Debug, Error)]
#[error("error reading directory record {position}")]
pub struct LoadError<E> {
    /// Zero-based position of the failing record.
    pub position: usize,
    #[source]
    pub source: E,
}

/// The searchable fields of a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Profile {
    pub id: UserId,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
}

/// Name changes a user may make. Empty fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
}

impl ProfileUpdate {
    /// The profile with this update applied.
    pub fn apply_to(&self, profile: &Profile) -> Result<Profile, DirectoryError> {
        if self.first_name.is_empty() && self.last_name.is_empty() {
            return Err(DirectoryError::EmptyUpdate);
        }
        let mut updated = profile.clone();
        if !self.first_name.is_empty() {
            updated.first_name.clone_from(&self.first_name);
        }
        if !self.last_name.is_empty() {
            updated.last_name.clone_from(&self.last_name);
        }
        Ok(updated)
    }
}

/// Keys under which `profile` is indexed.
///
/// First and last name are lower-cased and split on single spaces, each
/// piece trimmed; the lower-cased handle comes last. Empty pieces are
/// dropped. Tokens may repeat.
pub fn search_tokens(profile: &Profile) -> Vec<String> {
    let mut tokens = Vec::new();
    for name in [&profile.first_name, &profile.last_name] {
        tokens.extend(
            name.to_lowercase()
                .split(' ')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned),
        );
    }
    let handle = profile.user_name.trim().to_lowercase();
    if !handle.is_empty() {
        tokens.push(handle);
    }
    tokens
}

fn index_profile(trie: &mut PrefixTrie<UserId>, profile: &Profile) -> usize {
    let mut added = 0;
    for token in search_tokens(profile) {
        if trie.insert(&token, profile.id) {
            added += 1;
        }
    }
    added
}

fn unindex_profile(trie: &mut PrefixTrie<UserId>, profile: &Profile) -> usize {
    let mut removed = 0;
    for token in search_tokens(profile) {
        if trie.remove(&token, profile.id) {
            removed += 1;
        }
    }
    removed
}

/// Prefix search over user profiles.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    index: PrefixIndex<UserId>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            index: PrefixIndex::with_config(config),
        }
    }

    /// Build an index from every record of the system of record.
    ///
    /// The first record that fails aborts the load; nothing is returned
    /// until all records have been indexed.
    pub fn load<I, E>(records: I) -> Result<Self, LoadError<E>>
    where
        I: IntoIterator<Item = Result<Profile, E>>,
    {
        Self::load_with_config(Config::default(), records)
    }

    pub fn load_with_config<I, E>(config: Config, records: I) -> Result<Self, LoadError<E>>
    where
        I: IntoIterator<Item = Result<Profile, E>>,
    {
        let mut trie = PrefixTrie::with_capacity(config.initial_capacity);
        let mut profiles = 0usize;
        for (position, record) in records.into_iter().enumerate() {
            let profile = match record {
                Ok(profile) => profile,
                Err(source) => {
                    warn!(position, profiles, "directory load aborted");
                    return Err(LoadError { position, source });
                }
            };
            index_profile(&mut trie, &profile);
            profiles += 1;
        }

        info!(
            profiles,
            pairs = trie.len(),
            nodes = trie.node_count(),
            "directory index loaded"
        );
        Ok(Self {
            index: PrefixIndex::from_trie(trie, config),
        })
    }

    /// The underlying index.
    pub fn index(&self) -> &PrefixIndex<UserId> {
        &self.index
    }

    /// Index a newly created profile. Returns the number of new pairs.
    pub fn add_profile(&self, profile: &Profile) -> usize {
        let added = self.index.batch(|trie| index_profile(trie, profile));
        debug!(id = profile.id, added, "profile indexed");
        added
    }

    /// Drop every pair derived from `profile`. Returns the number removed.
    pub fn remove_profile(&self, profile: &Profile) -> usize {
        let removed = self.index.batch(|trie| unindex_profile(trie, profile));
        debug!(id = profile.id, removed, "profile unindexed");
        removed
    }

    /// Replace the tokens of `old` with those of `new` in one step.
    pub fn reindex(&self, old: &Profile, new: &Profile) {
        let (removed, added) = self.index.batch(|trie| {
            let removed = unindex_profile(trie, old);
            let added = index_profile(trie, new);
            (removed, added)
        });
        debug!(id = new.id, removed, added, "profile reindexed");
    }

    /// Apply `update` to `profile`, re-index it and return the new profile.
    pub fn apply_update(
        &self,
        profile: &Profile,
        update: &ProfileUpdate,
    ) -> Result<Profile, DirectoryError> {
        let updated = update.apply_to(profile)?;
        self.reindex(profile, &updated);
        Ok(updated)
    }

    /// Ids of profiles with a token starting with `query`, at most
    /// [`Config::max_results`] of them.
    pub fn search(&self, query: &str) -> Result<Vec<UserId>, DirectoryError> {
        self.search_with_limit(query, self.index.config().max_results)
    }

    /// Like [`search`](Self::search) with an explicit limit.
    ///
    /// The query is trimmed and lower-cased to match how tokens are stored.
    pub fn search_with_limit(&self, query: &str, max: usize) -> Result<Vec<UserId>, DirectoryError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(DirectoryError::EmptyQuery);
        }
        let ids = self.index.find(&query, max);
        debug!(query = %query, hits = ids.len(), "directory search");
        Ok(ids)
    }
}
