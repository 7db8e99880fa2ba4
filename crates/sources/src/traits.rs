//! Collaborator interfaces the core consumes.
//!
//! The streaming platform is reached only through these three traits, so the
//! evaluation engine can run against the real Web API client or an in-memory
//! fake.
//!
//! ## Design Note
//! - `Send + Sync` lets collaborators be shared behind `Arc` across tasks
//! - Listers return one page per call; pagination is driven by the caller
//! - None of these retry: a failure is reported as-is

use async_trait::async_trait;
use domain::{Episode, EpisodeId, TransportError};

use crate::types::{Page, PageRequest};

/// Looks up a show and lists its episodes, most-recent-first.
#[async_trait]
pub trait ShowEpisodeLister: Send + Sync {
    /// Display name of the show. An unknown show is an error.
    async fn show_name(&self, show_id: &str) -> Result<String, TransportError>;

    async fn list_episodes(
        &self,
        show_id: &str,
        request: PageRequest,
    ) -> Result<Page<Episode>, TransportError>;
}

/// Lists the episode identifiers currently in a playlist.
#[async_trait]
pub trait PlaylistContentLister: Send + Sync {
    /// Non-episode entries (music tracks, local files) must be left out.
    async fn list_playlist_episodes(
        &self,
        playlist_id: &str,
        request: PageRequest,
    ) -> Result<Page<EpisodeId>, TransportError>;
}

/// Appends episodes to the end of a playlist.
#[async_trait]
pub trait PlaylistAppender: Send + Sync {
    /// Largest number of episodes accepted by one `append` call
    fn max_batch_size(&self) -> usize {
        100
    }

    /// Append in the given order. Safe to retry with the same set.
    async fn append(
        &self,
        playlist_id: &str,
        episode_ids: &[EpisodeId],
    ) -> Result<(), TransportError>;
}
