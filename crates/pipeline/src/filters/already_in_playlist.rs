//! Filter to skip episodes the target playlist already holds.
//!
//! Placed after the title filter so that an episode which would not match
//! anyway is reported as a pattern miss rather than a duplicate.

use crate::traits::{Filter, FilterContext};
use domain::{Episode, MatchReason};

/// Rejects episodes whose identifier is in the playlist's DuplicateIndex.
///
/// ## Algorithm
/// Uses the HashSet behind `FilterContext.existing` for O(1) lookups.
pub struct AlreadyInPlaylistFilter;

impl Filter for AlreadyInPlaylistFilter {
    fn name(&self) -> &str {
        "AlreadyInPlaylistFilter"
    }

    fn reject(&self, episode: &Episode, context: &FilterContext<'_>) -> Option<MatchReason> {
        context
            .existing
            .contains(&episode.id)
            .then_some(MatchReason::AlreadyInPlaylist)
    }
}
