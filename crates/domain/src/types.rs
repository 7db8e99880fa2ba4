//! Core domain types for podcast filtering.
//!
//! This module defines the data structures shared by every other crate:
//! - Type aliases for platform identifiers (EpisodeId, ShowId, PlaylistId)
//! - Episode, the read-only projection of a platform episode
//! - FilterConfig, one validated filter rule set
//! - MatchReason / MatchResult, the per-episode classification

use crate::error::{ConfigError, Result};
use crate::identifier::{ResourceKind, resolve_identifier};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================
// Identifiers are opaque strings handed out by the platform.

/// Unique identifier for an episode (authoritative for deduplication)
pub type EpisodeId = String;

/// Bare identifier of a show, after URL/URI normalization
pub type ShowId = String;

/// Bare identifier of a playlist, after URL/URI normalization
pub type PlaylistId = String;

/// Default number of recent episodes inspected per filter
pub const DEFAULT_MAX_EPISODES: usize = 50;

// =============================================================================
// Episode
// =============================================================================

/// An episode as listed by the platform.
///
/// Release order is implicit: sources yield episodes most-recent-first and
/// nothing downstream reorders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    /// Empty when the platform omitted the title
    pub title: String,
}

impl Episode {
    pub fn new(id: impl Into<EpisodeId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Build an episode from a listing where the title may be null.
    pub fn with_optional_title(id: impl Into<EpisodeId>, title: Option<String>) -> Self {
        Self {
            id: id.into(),
            title: title.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Fetch bound
// =============================================================================

/// How many of a show's most recent episodes a filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxEpisodes {
    /// Stop after this many episodes (always > 0)
    Limit(usize),
    /// Paginate until the show's listing is exhausted
    Unbounded,
}

impl MaxEpisodes {
    /// The numeric bound, or `None` when unbounded
    pub fn limit(self) -> Option<usize> {
        match self {
            MaxEpisodes::Limit(n) => Some(n),
            MaxEpisodes::Unbounded => None,
        }
    }
}

impl Default for MaxEpisodes {
    fn default() -> Self {
        MaxEpisodes::Limit(DEFAULT_MAX_EPISODES)
    }
}

impl fmt::Display for MaxEpisodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxEpisodes::Limit(n) => write!(f, "{}", n),
            MaxEpisodes::Unbounded => f.write_str("all"),
        }
    }
}

// =============================================================================
// FilterConfig
// =============================================================================

/// One named rule set mapping a show to a playlist.
///
/// Immutable once built. Construction checks the structure of every field;
/// regex compilation and identifier resolution are left to evaluation so that
/// their failures stay scoped to this filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    name: String,
    show: String,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    target_playlist: String,
    max_episodes: MaxEpisodes,
}

impl FilterConfig {
    /// Create a validated filter configuration.
    ///
    /// # Errors
    /// - `MissingField` for a blank name, show, playlist, or no include pattern
    /// - `InvalidValue` for blank pattern strings or a zero episode limit
    pub fn new(
        name: impl Into<String>,
        show: impl Into<String>,
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
        target_playlist: impl Into<String>,
        max_episodes: MaxEpisodes,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::MissingField {
                filter: "unnamed filter".to_string(),
                field: "name",
            });
        }
        let label = format!("filter '{}'", name);

        let show = show.into().trim().to_string();
        if show.is_empty() {
            return Err(ConfigError::MissingField {
                filter: label,
                field: "show_id",
            });
        }

        let target_playlist = target_playlist.into().trim().to_string();
        if target_playlist.is_empty() {
            return Err(ConfigError::MissingField {
                filter: label,
                field: "target_playlist_id",
            });
        }

        if include_patterns.is_empty() {
            return Err(ConfigError::MissingField {
                filter: label,
                field: "name_patterns",
            });
        }
        for (field, patterns) in [
            ("name_patterns", &include_patterns),
            ("exclude_patterns", &exclude_patterns),
        ] {
            if patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    filter: label,
                    field,
                    value: "empty pattern".to_string(),
                });
            }
        }

        if max_episodes == MaxEpisodes::Limit(0) {
            return Err(ConfigError::InvalidValue {
                filter: label,
                field: "max_episodes",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            name,
            show,
            include_patterns,
            exclude_patterns,
            target_playlist,
            max_episodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw show reference as configured (id, URI or URL)
    pub fn show(&self) -> &str {
        &self.show
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// Raw playlist reference as configured (id, URI or URL)
    pub fn target_playlist(&self) -> &str {
        &self.target_playlist
    }

    pub fn max_episodes(&self) -> MaxEpisodes {
        self.max_episodes
    }

    /// Label used in error messages
    pub fn label(&self) -> String {
        format!("filter '{}'", self.name)
    }

    /// Normalize the configured show reference to a bare identifier.
    pub fn resolve_show_id(&self) -> Result<ShowId> {
        resolve_identifier(&self.show, ResourceKind::Show).ok_or_else(|| {
            ConfigError::UnresolvableIdentifier {
                filter: self.label(),
                field: "show_id",
                value: self.show.clone(),
            }
        })
    }

    /// Normalize the configured playlist reference to a bare identifier.
    pub fn resolve_playlist_id(&self) -> Result<PlaylistId> {
        resolve_identifier(&self.target_playlist, ResourceKind::Playlist).ok_or_else(|| {
            ConfigError::UnresolvableIdentifier {
                filter: self.label(),
                field: "target_playlist_id",
                value: self.target_playlist.clone(),
            }
        })
    }
}

/// Run-wide settings from the `[global]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Keep going after a filter fails (default: true)
    pub continue_on_error: bool,
    /// Number of distinct playlists processed concurrently (default: 1)
    pub max_concurrent_playlists: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            max_concurrent_playlists: 1,
        }
    }
}

/// Everything a run needs from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub settings: RunSettings,
    pub filters: Vec<FilterConfig>,
}

// =============================================================================
// Classification
// =============================================================================

/// Why an episode was or was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    /// Matches an include pattern, no exclude pattern, not in the playlist
    Matched,
    /// Matches an exclude pattern (exclude always wins)
    Excluded,
    /// Matches no include pattern, or has no title
    NoPatternMatch,
    /// Would match, but the playlist already holds this episode
    AlreadyInPlaylist,
}

impl MatchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchReason::Matched => "matched",
            MatchReason::Excluded => "excluded",
            MatchReason::NoPatternMatch => "no-pattern-match",
            MatchReason::AlreadyInPlaylist => "already-in-playlist",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one fetched episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub episode: Episode,
    pub reason: MatchReason,
}

impl MatchResult {
    pub fn new(episode: Episode, reason: MatchReason) -> Self {
        Self { episode, reason }
    }

    /// True only for episodes that should be appended
    pub fn verdict(&self) -> bool {
        self.reason == MatchReason::Matched
    }

    /// True when the title passed the patterns, whether or not it is a duplicate
    pub fn matched_patterns(&self) -> bool {
        matches!(
            self.reason,
            MatchReason::Matched | MatchReason::AlreadyInPlaylist
        )
    }
}
