//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::filters::{AlreadyInPlaylistFilter, TitlePatternFilter};
use crate::matcher::PatternMatcher;
use crate::traits::{Filter, FilterContext};
use domain::{ConfigError, Episode, FilterConfig, MatchReason, MatchResult};
use rayon::prelude::*;
use tracing;

/// Chains multiple filters together into a classification pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(TitlePatternFilter::new(matcher))
///     .add_filter(AlreadyInPlaylistFilter);
///
/// let results = pipeline.classify(&episodes, &FilterContext::new(&existing));
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Standard pipeline for one filter configuration: title patterns first,
    /// then the playlist duplicate check.
    ///
    /// # Errors
    /// `ConfigError::InvalidPattern` if any pattern fails to compile.
    pub fn for_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let matcher = PatternMatcher::compile(
            &config.label(),
            config.include_patterns(),
            config.exclude_patterns(),
        )?;
        Ok(Self::new()
            .add_filter(TitlePatternFilter::new(matcher))
            .add_filter(AlreadyInPlaylistFilter))
    }

    /// Add a filter to the pipeline (builder pattern).
    ///
    /// # Arguments
    /// * `filter` - Any type implementing the Filter trait
    ///
    /// # Returns
    /// Self for method chaining
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Classify every episode.
    ///
    /// ## Algorithm
    /// 1. For each episode, run the filters in order
    /// 2. The first filter that rejects decides the reason
    /// 3. Episodes no filter rejects are `Matched`
    ///
    /// Episodes are classified in parallel, but the returned results are in
    /// the same order as `episodes`.
    ///
    /// This blocks the calling thread until rayon is done. Async callers on a
    /// multi-threaded runtime should wrap it in `tokio::task::block_in_place`.
    pub fn classify(&self, episodes: &[Episode], context: &FilterContext<'_>) -> Vec<MatchResult> {
        let results: Vec<MatchResult> = episodes
            .par_iter()
            .map(|episode| {
                let reason = self
                    .filters
                    .iter()
                    .find_map(|filter| filter.reject(episode, context))
                    .unwrap_or(MatchReason::Matched);
                MatchResult::new(episode.clone(), reason)
            })
            .collect();

        tracing::debug!(
            "Classified {} episodes with [{}] ({} matched)",
            results.len(),
            self.filters
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", "),
            results.iter().filter(|r| r.verdict()).count()
        );
        results
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
