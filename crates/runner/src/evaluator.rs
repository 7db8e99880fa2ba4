//! # Filter Evaluator
//!
//! Runs one filter configuration end to end:
//! 1. Resolve the show and playlist identifiers
//! 2. Compile the title patterns
//! 3. Look the show up, so a wrong show id fails before anything else
//! 4. Build (or reuse) the playlist's duplicate index
//! 5. Fetch up to `max_episodes` recent episodes
//! 6. Classify each episode: patterns first, then the duplicate index
//! 7. Collect the matched, not-yet-present episodes in fetch order
//! 8. Append them in sub-batches no larger than the appender accepts
//!
//! Every failure is terminal for this filter only and lands on the outcome.
//! Counts computed before the failure are kept; `episodes_added` lists only
//! the episodes of acknowledged sub-batches.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use domain::{Episode, EpisodeId, FilterConfig, FilterError, MatchResult};
use pipeline::{FilterContext, FilterPipeline};
use sources::{EpisodeSource, PlaylistAppender, PlaylistContentLister, ShowEpisodeLister};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, instrument, warn};

use crate::index_cache::PlaylistIndexCache;
use crate::outcome::FilterOutcome;

/// Evaluates filter configurations against a streaming platform.
#[derive(Clone)]
pub struct FilterEvaluator {
    shows: Arc<dyn ShowEpisodeLister>,
    episodes: EpisodeSource,
    playlists: Arc<dyn PlaylistContentLister>,
    appender: Arc<dyn PlaylistAppender>,
}

impl FilterEvaluator {
    /// Use one platform client for reading and writing.
    pub fn new<P>(platform: Arc<P>) -> Self
    where
        P: ShowEpisodeLister + PlaylistContentLister + PlaylistAppender + 'static,
    {
        Self::from_parts(platform.clone(), platform.clone(), platform)
    }

    /// Wire each collaborator separately, e.g. a recording appender for dry runs.
    pub fn from_parts(
        shows: Arc<dyn ShowEpisodeLister>,
        playlists: Arc<dyn PlaylistContentLister>,
        appender: Arc<dyn PlaylistAppender>,
    ) -> Self {
        Self {
            episodes: EpisodeSource::new(shows.clone()),
            shows,
            playlists,
            appender,
        }
    }

    /// Evaluate one configuration. Never fails: errors end up on the outcome.
    #[instrument(skip(self, config, cache), fields(filter = %config.name()))]
    pub async fn evaluate(
        &self,
        config: &FilterConfig,
        cache: &mut PlaylistIndexCache,
    ) -> FilterOutcome {
        let start = Instant::now();
        let mut outcome = FilterOutcome::new(config.name());

        match self.evaluate_into(config, cache, &mut outcome).await {
            Ok(()) => info!(
                "{}: checked {}, matched {}, added {} in {:?}",
                config.label(),
                outcome.episodes_checked,
                outcome.episodes_matched,
                outcome.episodes_added.len(),
                start.elapsed()
            ),
            Err(error) => {
                warn!("{} failed: {}", config.label(), error);
                outcome.error = Some(error);
            }
        }
        outcome
    }

    async fn evaluate_into(
        &self,
        config: &FilterConfig,
        cache: &mut PlaylistIndexCache,
        outcome: &mut FilterOutcome,
    ) -> Result<(), FilterError> {
        let show_id = config.resolve_show_id()?;
        outcome.show_id = Some(show_id.clone());
        let playlist_id = config.resolve_playlist_id()?;
        outcome.playlist_id = Some(playlist_id.clone());

        let pipeline = FilterPipeline::for_config(config)?;

        let show_name = self.shows.show_name(&show_id).await?;
        info!("{}: show '{}'", config.label(), show_name);
        outcome.show_name = Some(show_name);

        let existing = cache
            .get_or_build(self.playlists.as_ref(), &playlist_id)
            .await?;
        let episodes = self
            .episodes
            .fetch(&show_id, config.max_episodes())
            .await?;

        let results = classify_blocking(&pipeline, &episodes, &FilterContext::new(existing));
        outcome.episodes_checked = results.len();
        outcome.episodes_matched = results.iter().filter(|r| r.matched_patterns()).count();
        let pending = pending_additions(&results);
        outcome.match_results = results;

        if pending.is_empty() {
            debug!("Nothing new for playlist {}", playlist_id);
            return Ok(());
        }
        self.append_all(&playlist_id, &pending, cache, outcome).await
    }

    /// Append in order, one sub-batch at a time. Stops at the first failure.
    async fn append_all(
        &self,
        playlist_id: &str,
        pending: &[Episode],
        cache: &mut PlaylistIndexCache,
        outcome: &mut FilterOutcome,
    ) -> Result<(), FilterError> {
        let batch_size = self.appender.max_batch_size().max(1);

        for batch in pending.chunks(batch_size) {
            let ids: Vec<EpisodeId> = batch.iter().map(|e| e.id.clone()).collect();
            if let Err(error) = self.appender.append(playlist_id, &ids).await {
                cache.invalidate(playlist_id);
                return Err(error.into());
            }
            debug!("Appended {} episodes to playlist {}", ids.len(), playlist_id);
            cache.record_added(playlist_id, ids);
            outcome.episodes_added.extend_from_slice(batch);
        }
        Ok(())
    }
}

/// Run the rayon classification without stalling other tasks on this worker.
///
/// On a multi-threaded runtime the worker's queued tasks move elsewhere for
/// the duration; a current-thread runtime has nowhere to move them, so the
/// call runs inline there.
fn classify_blocking(
    pipeline: &FilterPipeline,
    episodes: &[Episode],
    context: &FilterContext<'_>,
) -> Vec<MatchResult> {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(|| pipeline.classify(episodes, context))
        }
        _ => pipeline.classify(episodes, context),
    }
}

/// Matched episodes in fetch order, each identifier once.
fn pending_additions(results: &[MatchResult]) -> Vec<Episode> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| r.verdict())
        .filter(|r| seen.insert(r.episode.id.as_str()))
        .map(|r| r.episode.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ConfigError, MatchReason, MaxEpisodes, TransportError};
    use sources::memory::InMemoryPlatform;

    fn filter(show: &str, include: &[&str], exclude: &[&str], playlist: &str) -> FilterConfig {
        FilterConfig::new(
            "Test",
            show,
            include.iter().map(|s| s.to_string()).collect(),
            exclude.iter().map(|s| s.to_string()).collect(),
            playlist,
            MaxEpisodes::Unbounded,
        )
        .unwrap()
    }

    fn episodes(titles: &[(&str, &str)]) -> Vec<Episode> {
        titles.iter().map(|(id, t)| Episode::new(*id, *t)).collect()
    }

    #[test]
    fn test_pending_additions_dedups_ids_in_order() {
        let results = vec![
            MatchResult::new(Episode::new("b", "x"), MatchReason::Matched),
            MatchResult::new(Episode::new("a", "x"), MatchReason::Excluded),
            MatchResult::new(Episode::new("a", "x"), MatchReason::Matched),
            MatchResult::new(Episode::new("b", "x"), MatchReason::Matched),
        ];

        let ids: Vec<String> = pending_additions(&results)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_adds_new_matches_in_fetch_order() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show(
                    "s1",
                    episodes(&[("e1", "Morning 1"), ("e2", "Evening"), ("e3", "Morning 3")]),
                )
                .with_playlist("pl", vec![]),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(
                &filter("spotify:show:s1", &["morning"], &[], "pl"),
                &mut PlaylistIndexCache::new(),
            )
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.show_id.as_deref(), Some("s1"));
        assert_eq!(outcome.episodes_checked, 3);
        assert_eq!(outcome.episodes_matched, 2);
        assert_eq!(outcome.added_ids(), vec!["e1", "e3"]);
        assert_eq!(platform.playlist_contents("pl"), vec!["e1", "e3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_classifies_on_multi_thread_runtime() {
        let many: Vec<Episode> = (0..300)
            .map(|i| Episode::new(format!("e{}", i), if i % 2 == 0 { "Morning" } else { "Evening" }))
            .collect();
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", many)
                .with_playlist("pl", vec![]),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.episodes_checked, 300);
        assert_eq!(outcome.episodes_matched, 150);
        assert_eq!(outcome.added_ids()[..2], ["e0", "e2"]);
    }

    #[test]
    fn test_classify_blocking_outside_a_runtime() {
        let config = filter("s1", &["morning"], &[], "pl");
        let pipeline = FilterPipeline::for_config(&config).unwrap();
        let index = domain::DuplicateIndex::default();

        let results = classify_blocking(
            &pipeline,
            &episodes(&[("e1", "Morning"), ("e2", "Evening")]),
            &FilterContext::new(&index),
        );

        assert_eq!(results[0].reason, MatchReason::Matched);
        assert_eq!(results[1].reason, MatchReason::NoPatternMatch);
    }

    #[tokio::test]
    async fn test_duplicates_count_as_matched_but_are_not_added() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", episodes(&[("e1", "Morning"), ("e2", "Morning")]))
                .with_playlist("pl", vec!["e2".to_string()]),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert_eq!(outcome.episodes_checked, 2);
        assert_eq!(outcome.episodes_matched, 2);
        assert_eq!(outcome.added_ids(), vec!["e1"]);
        assert_eq!(outcome.match_results[1].reason, MatchReason::AlreadyInPlaylist);
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_before_any_call() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", episodes(&[("e1", "x")]))
                .with_playlist("pl", vec![]),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["(bad"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Config(ConfigError::InvalidPattern { .. }))
        ));
        assert_eq!(platform.show_page_calls("s1"), 0);
        assert_eq!(platform.playlist_page_calls("pl"), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_show() {
        let platform = Arc::new(InMemoryPlatform::new().with_playlist("pl", vec![]));
        let evaluator = FilterEvaluator::new(platform);

        let outcome = evaluator
            .evaluate(
                &filter("not a show!", &["x"], &[], "pl"),
                &mut PlaylistIndexCache::new(),
            )
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Config(ConfigError::UnresolvableIdentifier { field: "show_id", .. }))
        ));
        assert!(outcome.show_id.is_none());
    }

    #[tokio::test]
    async fn test_unknown_show_fails_before_playlist_is_read() {
        let platform = Arc::new(InMemoryPlatform::new().with_playlist("pl", vec![]));
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("nosuchshow", &["x"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Transport(TransportError::Status { status: 404, .. }))
        ));
        assert!(outcome.show_name.is_none());
        assert_eq!(platform.playlist_page_calls("pl"), 0);
    }

    #[tokio::test]
    async fn test_show_name_is_reported() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", episodes(&[("e1", "Morning")]))
                .with_show_name("s1", "Breakfast Radio")
                .with_playlist("pl", vec![]),
        );
        let evaluator = FilterEvaluator::new(platform);

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.show_name.as_deref(), Some("Breakfast Radio"));
    }

    #[tokio::test]
    async fn test_index_failure_skips_fetch() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", episodes(&[("e1", "x")]))
                .with_playlist("pl", vec![])
                .fail_playlist_listing("pl"),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["x"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Transport(TransportError::Request(_)))
        ));
        assert_eq!(platform.show_page_calls("s1"), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_discards_partial_results() {
        let many: Vec<Episode> = (0..120)
            .map(|i| Episode::new(format!("e{}", i), "Morning"))
            .collect();
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", many)
                .with_playlist("pl", vec![])
                .fail_show_on_page("s1", 1),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Transport(TransportError::Status { status: 500, .. }))
        ));
        assert_eq!(outcome.episodes_checked, 0);
        assert!(outcome.episodes_added.is_empty());
        assert!(platform.append_calls().is_empty());
    }

    #[tokio::test]
    async fn test_partial_append_reports_acknowledged_batches_only() {
        let many: Vec<Episode> = (0..5)
            .map(|i| Episode::new(format!("e{}", i), "Morning"))
            .collect();
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", many)
                .with_playlist("pl", vec![])
                .with_max_batch_size(2)
                .fail_append_after_batches("pl", 1),
        );
        let evaluator = FilterEvaluator::new(platform.clone());
        let mut cache = PlaylistIndexCache::new();

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut cache)
            .await;

        assert!(matches!(
            outcome.error,
            Some(FilterError::Transport(TransportError::Status { status: 503, .. }))
        ));
        assert_eq!(outcome.episodes_matched, 5);
        assert_eq!(outcome.added_ids(), vec!["e0", "e1"]);
        assert_eq!(platform.playlist_contents("pl"), vec!["e0", "e1"]);
        assert_eq!(platform.append_calls().len(), 2);
        assert!(!cache.contains_playlist("pl"));
    }

    #[tokio::test]
    async fn test_sub_batches_respect_appender_limit() {
        let many: Vec<Episode> = (0..7)
            .map(|i| Episode::new(format!("e{}", i), "Morning"))
            .collect();
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", many)
                .with_playlist("pl", vec![])
                .with_max_batch_size(3),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(outcome.is_success());
        let sizes: Vec<usize> = platform
            .append_calls()
            .iter()
            .map(|(_, ids)| ids.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(outcome.episodes_added.len(), 7);
    }

    #[tokio::test]
    async fn test_no_matches_means_no_append_call() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_show("s1", episodes(&[("e1", "Evening")]))
                .with_playlist("pl", vec![]),
        );
        let evaluator = FilterEvaluator::new(platform.clone());

        let outcome = evaluator
            .evaluate(&filter("s1", &["morning"], &[], "pl"), &mut PlaylistIndexCache::new())
            .await;

        assert!(outcome.is_success());
        assert!(platform.append_calls().is_empty());
    }
}
