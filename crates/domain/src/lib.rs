//! # Domain Crate
//!
//! Shared vocabulary of the podcast filter.
//!
//! ## Main Components
//!
//! - **types**: Episode, FilterConfig, MaxEpisodes, MatchReason, MatchResult
//! - **identifier**: turn ids, URIs and URLs into bare platform identifiers
//! - **index**: DuplicateIndex, the O(1) "already in playlist" lookup
//! - **config**: load and validate the TOML configuration
//! - **error**: ConfigError, TransportError, FilterError, RunAbortError
//!
//! ## Example Usage
//!
//! ```ignore
//! use domain::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml"))?;
//! for filter in &config.filters {
//!     println!("{} -> {}", filter.name(), filter.resolve_playlist_id()?);
//! }
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod identifier;
pub mod index;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ConfigError, FilterError, Result, RunAbortError, TransportError};
pub use identifier::{ResourceKind, resolve_identifier};
pub use index::DuplicateIndex;
pub use types::{
    // Type aliases
    EpisodeId,
    PlaylistId,
    ShowId,
    // Core types
    Episode,
    FilterConfig,
    MatchReason,
    MatchResult,
    MaxEpisodes,
    RunConfig,
    RunSettings,
    DEFAULT_MAX_EPISODES,
};
