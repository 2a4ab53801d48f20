//! Tuning knobs for [`PrefixIndex`](crate::PrefixIndex) and
//! [`DirectoryIndex`](crate::DirectoryIndex).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result limit used by directory searches unless told otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Configuration for the index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Limit applied by [`PrefixIndex::find_default`](crate::PrefixIndex::find_default)
    /// and [`DirectoryIndex::search`](crate::DirectoryIndex::search).
    pub max_results: usize,
    /// Initial capacity hint for the node arena, in nodes.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            initial_capacity: 1024,
        }
    }
}
