//! # Sources Crate
//!
//! Read and write access to the streaming platform, seen through the
//! interfaces the filter engine needs.
//!
//! ## Components
//!
//! ### Collaborator traits
//! - `ShowEpisodeLister`: a show's name, and one page of its episodes,
//!   most-recent-first
//! - `PlaylistContentLister`: one page of a playlist's episode identifiers
//! - `PlaylistAppender`: append an ordered batch of episodes to a playlist
//!
//! ### EpisodeSource
//! Lazy, bounded pagination over a show's episodes. A failure on any page
//! fails the whole fetch.
//!
//! ### Playlist index
//! `build_duplicate_index` paginates a playlist to the end and returns the
//! `DuplicateIndex` used to suppress re-additions.
//!
//! ### In-memory platform
//! `memory::InMemoryPlatform` implements all three traits for tests.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{EpisodeSource, build_duplicate_index};
//! use domain::MaxEpisodes;
//! use std::sync::Arc;
//!
//! let source = EpisodeSource::new(client.clone());
//! let episodes = source.fetch(&show_id, MaxEpisodes::Limit(50)).await?;
//! let existing = build_duplicate_index(client.as_ref(), &playlist_id).await?;
//! ```

// Public modules
pub mod episode_source;
pub mod memory;
pub mod playlist_index;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use episode_source::EpisodeSource;
pub use playlist_index::build_duplicate_index;
pub use traits::{PlaylistAppender, PlaylistContentLister, ShowEpisodeLister};
pub use types::{MAX_EPISODE_PAGE_SIZE, MAX_PLAYLIST_PAGE_SIZE, Page, PageRequest, PageToken};
