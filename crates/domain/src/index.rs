//! DuplicateIndex: the set of episodes already present in a playlist.
//!
//! Keyed by the platform's episode identifier, never by title: titles can
//! collide or be edited, identifiers are authoritative.

use crate::types::EpisodeId;
use std::collections::HashSet;

/// O(1) membership lookup for a playlist's current episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateIndex {
    ids: HashSet<EpisodeId>,
}

impl DuplicateIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from a playlist's existing episode identifiers.
    pub fn build<I>(existing: I) -> Self
    where
        I: IntoIterator<Item = EpisodeId>,
    {
        Self {
            ids: existing.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an episode that was appended during this run.
    ///
    /// Returns false if it was already known.
    pub fn insert(&mut self, id: EpisodeId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<EpisodeId> for DuplicateIndex {
    fn from_iter<T: IntoIterator<Item = EpisodeId>>(iter: T) -> Self {
        Self::build(iter)
    }
}

impl Extend<EpisodeId> for DuplicateIndex {
    fn extend<T: IntoIterator<Item = EpisodeId>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}
