//! End-to-end runs against the in-memory platform.

use std::sync::Arc;

use domain::{ConfigError, Episode, FilterConfig, FilterError, MatchReason, MaxEpisodes};
use runner::{BatchRunner, FilterEvaluator, RunnerOptions, StopSignal};
use sources::memory::InMemoryPlatform;

fn filter(name: &str, show: &str, include: &[&str], exclude: &[&str], playlist: &str) -> FilterConfig {
    FilterConfig::new(
        name,
        show,
        include.iter().map(|s| s.to_string()).collect(),
        exclude.iter().map(|s| s.to_string()).collect(),
        playlist,
        MaxEpisodes::Unbounded,
    )
    .unwrap()
}

fn morning_show(count: usize) -> Vec<Episode> {
    (0..count)
        .map(|i| Episode::new(format!("e{}", i), format!("Morning Show {}", i)))
        .collect()
}

fn runner(platform: &Arc<InMemoryPlatform>, continue_on_error: bool) -> BatchRunner {
    BatchRunner::new(
        FilterEvaluator::new(platform.clone()),
        RunnerOptions {
            continue_on_error,
            max_concurrent_playlists: 1,
        },
    )
}

#[tokio::test]
async fn test_added_episodes_preserve_fetch_order() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(3))
            .with_playlist("pl", vec![]),
    );

    let summary = runner(&platform, true)
        .run(&[filter("F", "s1", &["morning"], &[], "pl")])
        .await;

    assert_eq!(summary.outcomes[0].added_ids(), vec!["e0", "e1", "e2"]);
    assert_eq!(platform.playlist_contents("pl"), vec!["e0", "e1", "e2"]);
}

#[tokio::test]
async fn test_exclude_takes_precedence() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", vec![Episode::new("e1", "Morning Show Replay")])
            .with_playlist("pl", vec![]),
    );

    let summary = runner(&platform, true)
        .run(&[filter("F", "s1", &[".*Morning.*"], &[".*Replay.*"], "pl")])
        .await;

    let outcome = &summary.outcomes[0];
    assert!(outcome.episodes_added.is_empty());
    assert_eq!(outcome.match_results[0].reason, MatchReason::Excluded);
    assert_eq!(summary.total_matched, 0);
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(4))
            .with_playlist("pl", vec![]),
    );
    let configs = [filter("F", "s1", &["morning"], &[], "pl")];

    let first = runner(&platform, true).run(&configs).await;
    let second = runner(&platform, true).run(&configs).await;

    assert_eq!(first.total_added, 4);
    assert_eq!(second.total_added, 0);
    assert_eq!(second.total_matched, 4);
    assert_eq!(platform.playlist_contents("pl").len(), 4);
}

#[tokio::test]
async fn test_bounded_fetch_evaluates_exactly_the_bound() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(200))
            .with_playlist("pl", vec![]),
    );
    let config = FilterConfig::new(
        "F",
        "s1",
        vec!["morning".to_string()],
        vec![],
        "pl",
        MaxEpisodes::Limit(50),
    )
    .unwrap();

    let summary = runner(&platform, true).run(&[config]).await;

    assert_eq!(summary.outcomes[0].episodes_checked, 50);
    assert_eq!(platform.show_page_calls("s1"), 1);
}

#[tokio::test]
async fn test_unbounded_fetch_reads_every_page() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(237))
            .with_playlist("pl", vec![]),
    );

    let summary = runner(&platform, true)
        .run(&[filter("F", "s1", &["morning"], &[], "pl")])
        .await;

    assert_eq!(summary.outcomes[0].episodes_checked, 237);
    assert_eq!(platform.show_page_calls("s1"), 5);
    // 237 additions in batches of at most 100
    assert_eq!(platform.append_calls().len(), 3);
}

#[tokio::test]
async fn test_failing_filter_is_isolated() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(2))
            .with_playlist("pl", vec![]),
    );
    let configs = [
        filter("F1", "s1", &["(unclosed"], &[], "pl"),
        filter("F2", "s1", &["morning"], &[], "pl"),
    ];

    let summary = runner(&platform, true).run(&configs).await;

    assert_eq!(summary.filters_total, 2);
    assert_eq!(summary.filters_succeeded, 1);
    assert_eq!(summary.outcomes.len(), 2);
    assert!(matches!(
        summary.outcomes[0].error,
        Some(FilterError::Config(ConfigError::InvalidPattern { .. }))
    ));
    assert_eq!(summary.outcomes[1].episodes_added.len(), 2);
    assert!(summary.aborted.is_none());
    assert!(summary.has_failures());
}

#[tokio::test]
async fn test_abort_on_error_skips_remaining_filters() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(2))
            .with_show("s2", morning_show(2))
            .with_playlist("pl", vec![]),
    );
    let configs = [
        filter("F1", "s1", &["(unclosed"], &[], "pl"),
        filter("F2", "s2", &["morning"], &[], "pl"),
    ];

    let summary = runner(&platform, false).run(&configs).await;

    assert_eq!(summary.filters_total, 2);
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.filters_succeeded, 0);
    let aborted = summary.aborted.as_ref().unwrap();
    assert_eq!(aborted.filter, "F1");
    assert!(aborted.reason.contains("(unclosed"));
    assert_eq!(platform.show_page_calls("s2"), 0);
    assert!(platform.append_calls().is_empty());
}

#[tokio::test]
async fn test_filters_sharing_a_playlist_never_add_twice() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(3))
            .with_playlist("pl", vec![]),
    );
    let configs = [
        filter("All", "s1", &["show"], &[], "pl"),
        filter("Mornings", "s1", &["morning"], &[], "pl"),
    ];

    let summary = runner(&platform, true).run(&configs).await;

    assert_eq!(summary.outcomes[0].episodes_added.len(), 3);
    assert!(summary.outcomes[1].episodes_added.is_empty());
    assert_eq!(summary.outcomes[1].episodes_matched, 3);
    assert_eq!(platform.playlist_contents("pl").len(), 3);
    // One listing shared by both filters
    assert_eq!(platform.playlist_page_calls("pl"), 1);
}

#[tokio::test]
async fn test_failed_append_forces_index_rebuild_for_next_filter() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(3))
            .with_playlist("pl", vec![])
            .with_max_batch_size(2)
            .fail_append_after_batches("pl", 1),
    );
    let configs = [
        filter("First", "s1", &["morning"], &[], "pl"),
        filter("Second", "s1", &["morning"], &[], "pl"),
    ];

    let summary = runner(&platform, true).run(&configs).await;

    assert_eq!(summary.outcomes[0].added_ids(), vec!["e0", "e1"]);
    assert!(!summary.outcomes[0].is_success());
    assert_eq!(platform.playlist_page_calls("pl"), 2);
    // The rebuilt index knows about e0 and e1
    let second = &summary.outcomes[1];
    assert_eq!(second.match_results[0].reason, MatchReason::AlreadyInPlaylist);
    assert_eq!(second.match_results[1].reason, MatchReason::AlreadyInPlaylist);
}

#[tokio::test]
async fn test_raised_stop_signal_starts_nothing() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(2))
            .with_playlist("pl", vec![]),
    );
    let stop = StopSignal::new();
    stop.raise();

    let summary = runner(&platform, true)
        .with_stop_signal(stop)
        .run(&[filter("F", "s1", &["morning"], &[], "pl")])
        .await;

    assert!(summary.stopped);
    assert!(summary.outcomes.is_empty());
    assert_eq!(summary.filters_total, 1);
    assert_eq!(platform.show_page_calls("s1"), 0);
}

#[tokio::test]
async fn test_grouped_run_reports_in_input_order() {
    let platform = Arc::new(
        InMemoryPlatform::new()
            .with_show("s1", morning_show(3))
            .with_playlist("pl1", vec![])
            .with_playlist("pl2", vec!["e1".to_string()]),
    );
    let configs = [
        filter("A", "s1", &["morning"], &[], "pl1"),
        filter("B", "s1", &["morning"], &[], "spotify:playlist:pl2"),
        filter("C", "s1", &["show"], &[], "pl1"),
    ];
    let runner = BatchRunner::new(
        FilterEvaluator::new(platform.clone()),
        RunnerOptions {
            continue_on_error: true,
            max_concurrent_playlists: 2,
        },
    );

    let summary = runner.run(&configs).await;

    let names: Vec<&str> = summary
        .outcomes
        .iter()
        .map(|o| o.filter_name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(summary.outcomes[0].added_ids(), vec!["e0", "e1", "e2"]);
    assert_eq!(summary.outcomes[1].added_ids(), vec!["e0", "e2"]);
    assert!(summary.outcomes[2].episodes_added.is_empty());
    assert_eq!(summary.total_added, 5);
    assert_eq!(platform.playlist_contents("pl2"), vec!["e1", "e0", "e2"]);
}
