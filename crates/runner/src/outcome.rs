//! Result records produced by a run.

use domain::{Episode, FilterError, MatchResult, PlaylistId, RunAbortError, ShowId};
use serde::{Serialize, Serializer};

/// What happened to one filter configuration.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub filter_name: String,
    /// Resolved show identifier, once resolution succeeded
    pub show_id: Option<ShowId>,
    /// Display name of the show, once looked up
    pub show_name: Option<String>,
    /// Resolved playlist identifier, once resolution succeeded
    pub playlist_id: Option<PlaylistId>,
    /// Episodes fetched and classified
    pub episodes_checked: usize,
    /// Episodes that passed the patterns, duplicates included
    pub episodes_matched: usize,
    /// Episodes acknowledged by the appender, in fetch order
    pub episodes_added: Vec<Episode>,
    /// Per-episode classification, in fetch order
    pub match_results: Vec<MatchResult>,
    /// Present iff the filter failed
    #[serde(serialize_with = "as_message")]
    pub error: Option<FilterError>,
}

impl FilterOutcome {
    pub fn new(filter_name: impl Into<String>) -> Self {
        Self {
            filter_name: filter_name.into(),
            show_id: None,
            show_name: None,
            playlist_id: None,
            episodes_checked: 0,
            episodes_matched: 0,
            episodes_added: Vec::new(),
            match_results: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn added_ids(&self) -> Vec<&str> {
        self.episodes_added.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Aggregate of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Number of configured filters, processed or not
    pub filters_total: usize,
    pub filters_succeeded: usize,
    pub total_matched: usize,
    pub total_added: usize,
    /// Outcomes of the processed filters, in input order
    pub outcomes: Vec<FilterOutcome>,
    /// Set when a failure stopped the run (`continue_on_error = false`)
    #[serde(serialize_with = "as_message")]
    pub aborted: Option<RunAbortError>,
    /// Set when the stop signal halted the run
    pub stopped: bool,
}

impl RunSummary {
    /// Aggregate the outcomes of a run over `filters_total` configurations.
    pub fn new(filters_total: usize, outcomes: Vec<FilterOutcome>) -> Self {
        Self {
            filters_total,
            filters_succeeded: outcomes.iter().filter(|o| o.is_success()).count(),
            total_matched: outcomes.iter().map(|o| o.episodes_matched).sum(),
            total_added: outcomes.iter().map(|o| o.episodes_added.len()).sum(),
            outcomes,
            aborted: None,
            stopped: false,
        }
    }

    pub fn with_abort(mut self, aborted: Option<RunAbortError>) -> Self {
        self.aborted = aborted;
        self
    }

    pub fn with_stopped(mut self, stopped: bool) -> Self {
        self.stopped = stopped;
        self
    }

    /// Outcomes that carry an error
    pub fn failures(&self) -> impl Iterator<Item = &FilterOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when some filter failed or the run aborted
    pub fn has_failures(&self) -> bool {
        self.aborted.is_some() || self.failures().next().is_some()
    }
}

fn as_message<E, S>(error: &Option<E>, serializer: S) -> Result<S::Ok, S::Error>
where
    E: std::fmt::Display,
    S: Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
