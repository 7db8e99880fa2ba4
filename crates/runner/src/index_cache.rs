//! Per-run cache of playlist duplicate indexes.
//!
//! Filters that target the same playlist share one index. Appends that the
//! platform acknowledged are folded back in, so a later filter never adds
//! the same episode again. A failed append drops the entry: the batch may
//! have been partially applied, and the next user rebuilds from the platform.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use domain::{DuplicateIndex, EpisodeId, PlaylistId, TransportError};
use sources::{PlaylistContentLister, build_duplicate_index};
use tracing::debug;

#[derive(Debug, Default)]
pub struct PlaylistIndexCache {
    indexes: HashMap<PlaylistId, DuplicateIndex>,
}

impl PlaylistIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached index for the playlist, building it on first use.
    pub async fn get_or_build(
        &mut self,
        lister: &dyn PlaylistContentLister,
        playlist_id: &str,
    ) -> Result<&mut DuplicateIndex, TransportError> {
        match self.indexes.entry(playlist_id.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Reusing index for playlist {}", playlist_id);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let index = build_duplicate_index(lister, playlist_id).await?;
                Ok(entry.insert(index))
            }
        }
    }

    /// Record episodes the platform acknowledged.
    pub fn record_added(&mut self, playlist_id: &str, ids: impl IntoIterator<Item = EpisodeId>) {
        if let Some(index) = self.indexes.get_mut(playlist_id) {
            index.extend(ids);
        }
    }

    pub fn invalidate(&mut self, playlist_id: &str) {
        if self.indexes.remove(playlist_id).is_some() {
            debug!("Dropped cached index for playlist {}", playlist_id);
        }
    }

    pub fn contains_playlist(&self, playlist_id: &str) -> bool {
        self.indexes.contains_key(playlist_id)
    }
}
