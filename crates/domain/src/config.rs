//! Loader for the TOML filter configuration.
//!
//! File layout:
//! ```toml
//! [global]
//! continue_on_error = true
//! max_concurrent_playlists = 1
//!
//! [[filters]]
//! name = "Morning episodes"
//! show_id = "https://open.spotify.com/show/4rOoJ6Egrf8K2IrywzwOMk"
//! name_patterns = ["morning"]
//! exclude_patterns = ["replay"]
//! target_playlist_id = "37i9dQZF1DXcBWIGoYBM5M"
//! max_episodes = 50   # or "all"
//! ```
//!
//! Raw serde structs are converted into validated `FilterConfig`s so that
//! structural mistakes fail at load time with the filter and field named.

use crate::error::{ConfigError, Result};
use crate::types::{FilterConfig, MaxEpisodes, RunConfig, RunSettings};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    global: RawGlobal,
    #[serde(default)]
    filters: Vec<RawFilter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGlobal {
    continue_on_error: Option<bool>,
    max_concurrent_playlists: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilter {
    name: Option<String>,
    show_id: Option<String>,
    #[serde(alias = "include_patterns")]
    name_patterns: Option<Vec<String>>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
    target_playlist_id: Option<String>,
    max_episodes: Option<RawMaxEpisodes>,
}

/// `max_episodes` accepts a positive integer or the keyword "all"
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMaxEpisodes {
    Count(i64),
    Keyword(String),
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;

    debug!("Loaded config file {}", path.display());
    parse_config(&content)
}

/// Parse configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<RunConfig> {
    let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if raw.filters.is_empty() {
        return Err(ConfigError::NoFilters);
    }

    let settings = convert_global(raw.global)?;
    let filters = raw
        .filters
        .into_iter()
        .enumerate()
        .map(|(idx, filter)| convert_filter(idx + 1, filter))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Parsed {} filter(s), continue_on_error={}",
        filters.len(),
        settings.continue_on_error
    );

    Ok(RunConfig { settings, filters })
}

fn convert_global(raw: RawGlobal) -> Result<RunSettings> {
    let defaults = RunSettings::default();
    let max_concurrent_playlists = raw
        .max_concurrent_playlists
        .unwrap_or(defaults.max_concurrent_playlists);

    if max_concurrent_playlists == 0 {
        return Err(ConfigError::InvalidValue {
            filter: "global".to_string(),
            field: "max_concurrent_playlists",
            value: "0".to_string(),
        });
    }

    Ok(RunSettings {
        continue_on_error: raw.continue_on_error.unwrap_or(defaults.continue_on_error),
        max_concurrent_playlists,
    })
}

fn convert_filter(position: usize, raw: RawFilter) -> Result<FilterConfig> {
    // Unnamed filters are reported by position
    let label = match raw.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("filter '{}'", name),
        _ => format!("filter #{}", position),
    };

    let name = raw.name.ok_or_else(|| ConfigError::MissingField {
        filter: label.clone(),
        field: "name",
    })?;
    let show = raw.show_id.ok_or_else(|| ConfigError::MissingField {
        filter: label.clone(),
        field: "show_id",
    })?;
    let include_patterns = raw.name_patterns.ok_or_else(|| ConfigError::MissingField {
        filter: label.clone(),
        field: "name_patterns",
    })?;
    let target_playlist = raw
        .target_playlist_id
        .ok_or_else(|| ConfigError::MissingField {
            filter: label.clone(),
            field: "target_playlist_id",
        })?;
    let max_episodes = match raw.max_episodes {
        None => MaxEpisodes::default(),
        Some(value) => convert_max_episodes(&label, value)?,
    };

    FilterConfig::new(
        name,
        show,
        include_patterns,
        raw.exclude_patterns,
        target_playlist,
        max_episodes,
    )
    .map_err(|e| match e {
        // Blank names only surface here; keep the positional label
        ConfigError::MissingField { field: "name", .. } => ConfigError::MissingField {
            filter: label,
            field: "name",
        },
        other => other,
    })
}

fn convert_max_episodes(label: &str, raw: RawMaxEpisodes) -> Result<MaxEpisodes> {
    match raw {
        RawMaxEpisodes::Count(n) if n > 0 => Ok(MaxEpisodes::Limit(n as usize)),
        RawMaxEpisodes::Count(n) => Err(ConfigError::InvalidValue {
            filter: label.to_string(),
            field: "max_episodes",
            value: n.to_string(),
        }),
        RawMaxEpisodes::Keyword(word)
            if word.eq_ignore_ascii_case("all") || word.eq_ignore_ascii_case("unbounded") =>
        {
            Ok(MaxEpisodes::Unbounded)
        }
        RawMaxEpisodes::Keyword(word) => Err(ConfigError::InvalidValue {
            filter: label.to_string(),
            field: "max_episodes",
            value: word,
        }),
    }
}
