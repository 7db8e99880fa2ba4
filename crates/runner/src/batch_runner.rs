//! # Batch Runner
//!
//! Evaluates every filter configuration of a run and aggregates the outcomes.
//!
//! ## Algorithm
//! 1. Walk the configurations in input order
//! 2. Before each one, check the stop signal
//! 3. Evaluate it; failures are captured on its outcome
//! 4. With `continue_on_error` off, the first failure ends the run
//!
//! With `max_concurrent_playlists > 1` (and `continue_on_error` on) filters
//! are grouped by target playlist. Groups run concurrently; inside a group the
//! filters still run one after another against the shared duplicate index.
//! Outcomes are reported in input order either way.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use domain::{FilterConfig, RunAbortError, RunSettings};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::evaluator::FilterEvaluator;
use crate::index_cache::PlaylistIndexCache;
use crate::outcome::{FilterOutcome, RunSummary};

/// Run-wide behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    pub continue_on_error: bool,
    pub max_concurrent_playlists: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        RunSettings::default().into()
    }
}

impl From<RunSettings> for RunnerOptions {
    fn from(settings: RunSettings) -> Self {
        Self {
            continue_on_error: settings.continue_on_error,
            max_concurrent_playlists: settings.max_concurrent_playlists.max(1),
        }
    }
}

/// Cooperative cancellation flag shared with the caller.
///
/// Once raised, no further filter starts. The filter in flight finishes.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcomes of one group, tagged with their input position
struct GroupResult {
    outcomes: Vec<(usize, FilterOutcome)>,
    stopped: bool,
}

pub struct BatchRunner {
    evaluator: FilterEvaluator,
    options: RunnerOptions,
    stop: StopSignal,
}

impl BatchRunner {
    pub fn new(evaluator: FilterEvaluator, options: RunnerOptions) -> Self {
        Self {
            evaluator,
            options,
            stop: StopSignal::new(),
        }
    }

    /// Share an externally owned stop signal
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Evaluate every configuration and summarize.
    pub async fn run(&self, configs: &[FilterConfig]) -> RunSummary {
        let start_time = Instant::now();
        info!("Running {} filter configurations", configs.len());

        let grouped = self.options.max_concurrent_playlists > 1;
        if grouped && !self.options.continue_on_error {
            warn!("max_concurrent_playlists ignored: continue_on_error is off");
        }

        let summary = if grouped && self.options.continue_on_error {
            self.run_grouped(configs).await
        } else {
            self.run_sequential(configs).await
        };

        info!(
            "Run finished in {:?}: {}/{} filters succeeded, {} matched, {} added",
            start_time.elapsed(),
            summary.filters_succeeded,
            summary.filters_total,
            summary.total_matched,
            summary.total_added
        );
        summary
    }

    async fn run_sequential(&self, configs: &[FilterConfig]) -> RunSummary {
        let mut cache = PlaylistIndexCache::new();
        let mut outcomes = Vec::with_capacity(configs.len());
        let mut aborted = None;
        let mut stopped = false;

        for config in configs {
            if self.stop.is_raised() {
                warn!("Stop requested, skipping remaining filters");
                stopped = true;
                break;
            }

            let outcome = self.evaluator.evaluate(config, &mut cache).await;
            let failure = outcome.error.as_ref().map(|e| e.to_string());
            outcomes.push(outcome);

            if let Some(reason) = failure {
                if !self.options.continue_on_error {
                    let abort = RunAbortError {
                        filter: config.name().to_string(),
                        reason,
                    };
                    warn!("{}", abort);
                    aborted = Some(abort);
                    break;
                }
            }
        }

        RunSummary::new(configs.len(), outcomes)
            .with_abort(aborted)
            .with_stopped(stopped)
    }

    async fn run_grouped(&self, configs: &[FilterConfig]) -> RunSummary {
        let groups = group_by_playlist(configs);
        info!(
            "Processing {} playlist groups, up to {} at a time",
            groups.len(),
            self.options.max_concurrent_playlists
        );

        let results: Vec<GroupResult> = stream::iter(groups)
            .map(|group| self.run_group(configs, group))
            .buffer_unordered(self.options.max_concurrent_playlists)
            .collect()
            .await;

        let stopped = results.iter().any(|r| r.stopped);
        let mut indexed: Vec<(usize, FilterOutcome)> =
            results.into_iter().flat_map(|r| r.outcomes).collect();
        indexed.sort_by_key(|(position, _)| *position);

        let outcomes = indexed.into_iter().map(|(_, outcome)| outcome).collect();
        RunSummary::new(configs.len(), outcomes).with_stopped(stopped)
    }

    async fn run_group(&self, configs: &[FilterConfig], group: Vec<usize>) -> GroupResult {
        let mut cache = PlaylistIndexCache::new();
        let mut outcomes = Vec::with_capacity(group.len());

        for position in group {
            if self.stop.is_raised() {
                return GroupResult {
                    outcomes,
                    stopped: true,
                };
            }
            let outcome = self.evaluator.evaluate(&configs[position], &mut cache).await;
            outcomes.push((position, outcome));
        }

        GroupResult {
            outcomes,
            stopped: false,
        }
    }
}

/// Input positions grouped by resolved target playlist, groups in order of
/// first appearance. An unresolvable playlist gets a group of its own.
fn group_by_playlist(configs: &[FilterConfig]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_playlist: HashMap<String, usize> = HashMap::new();

    for (position, config) in configs.iter().enumerate() {
        match config.resolve_playlist_id() {
            Ok(playlist_id) => {
                let slot = *by_playlist.entry(playlist_id).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(position);
            }
            Err(_) => groups.push(vec![position]),
        }
    }
    groups
}
