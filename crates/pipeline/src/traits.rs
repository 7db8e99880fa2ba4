//! Core traits for the classification pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible checks to be applied to each fetched episode.

use domain::{DuplicateIndex, Episode, MatchReason};

/// Read-only state a filter may consult while classifying.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Episodes already present in the target playlist
    pub existing: &'a DuplicateIndex,
}

impl<'a> FilterContext<'a> {
    pub fn new(existing: &'a DuplicateIndex) -> Self {
        Self { existing }
    }
}

/// Core trait for classifying episodes.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows episodes to be classified in parallel
/// - A filter either lets an episode through (`None`) or rejects it with
///   the reason that will be reported (`Some(reason)`)
/// - Filters are pure: the verdict depends only on the episode and context
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Decide whether `episode` passes this filter.
    fn reject(&self, episode: &Episode, context: &FilterContext<'_>) -> Option<MatchReason>;
}
