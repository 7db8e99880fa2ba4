//! Filter on episode titles using the filter's include/exclude patterns.

use crate::matcher::PatternMatcher;
use crate::traits::{Filter, FilterContext};
use domain::{Episode, MatchReason};

/// Rejects episodes whose title misses every include pattern or hits an
/// exclude pattern.
pub struct TitlePatternFilter {
    matcher: PatternMatcher,
}

impl TitlePatternFilter {
    /// Create a new TitlePatternFilter.
    ///
    /// # Arguments
    /// * `matcher` - Patterns compiled for one filter configuration
    pub fn new(matcher: PatternMatcher) -> Self {
        Self { matcher }
    }
}

impl Filter for TitlePatternFilter {
    fn name(&self) -> &str {
        "TitlePatternFilter"
    }

    fn reject(&self, episode: &Episode, _context: &FilterContext<'_>) -> Option<MatchReason> {
        match self.matcher.evaluate(&episode.title) {
            MatchReason::Matched => None,
            reason => Some(reason),
        }
    }
}
