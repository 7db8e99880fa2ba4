//! In-memory platform implementing every collaborator trait.
//!
//! Used by tests across the workspace to exercise pagination, deduplication
//! and failure isolation without network access. Pages are served with the
//! same size caps as the real platform and page tokens are plain offsets.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::{Episode, EpisodeId, PlaylistId, ShowId, TransportError};

use crate::traits::{PlaylistAppender, PlaylistContentLister, ShowEpisodeLister};
use crate::types::{MAX_EPISODE_PAGE_SIZE, MAX_PLAYLIST_PAGE_SIZE, Page, PageRequest};

#[derive(Default)]
struct PlatformState {
    shows: HashMap<ShowId, Vec<Episode>>,
    show_names: HashMap<ShowId, String>,
    playlists: HashMap<PlaylistId, Vec<EpisodeId>>,

    // Call accounting
    show_page_calls: HashMap<ShowId, usize>,
    playlist_page_calls: HashMap<PlaylistId, usize>,
    append_calls: Vec<(PlaylistId, Vec<EpisodeId>)>,

    // Failure injection
    failing_show_pages: HashMap<ShowId, usize>,
    failing_playlist_listings: HashSet<PlaylistId>,
    failing_append_batches: HashMap<PlaylistId, usize>,
}

/// Fake streaming platform holding shows and playlists in memory.
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
    max_batch_size: usize,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlatformState::default()),
            max_batch_size: 100,
        }
    }

    /// Register a show; episodes are given most-recent-first
    pub fn with_show(self, show_id: &str, episodes: Vec<Episode>) -> Self {
        self.state().shows.insert(show_id.to_string(), episodes);
        self
    }

    /// Give a registered show a display name (defaults to its id)
    pub fn with_show_name(self, show_id: &str, name: &str) -> Self {
        self.state()
            .show_names
            .insert(show_id.to_string(), name.to_string());
        self
    }

    /// Register a playlist with its current episode identifiers
    pub fn with_playlist(self, playlist_id: &str, episode_ids: Vec<EpisodeId>) -> Self {
        self.state()
            .playlists
            .insert(playlist_id.to_string(), episode_ids);
        self
    }

    /// Cap the number of ids accepted per append call
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Fail the show listing call with this zero-based page index
    pub fn fail_show_on_page(self, show_id: &str, page_index: usize) -> Self {
        self.state()
            .failing_show_pages
            .insert(show_id.to_string(), page_index);
        self
    }

    /// Fail every listing call for this playlist
    pub fn fail_playlist_listing(self, playlist_id: &str) -> Self {
        self.state()
            .failing_playlist_listings
            .insert(playlist_id.to_string());
        self
    }

    /// Accept this many append batches for the playlist, then fail
    pub fn fail_append_after_batches(self, playlist_id: &str, batches: usize) -> Self {
        self.state()
            .failing_append_batches
            .insert(playlist_id.to_string(), batches);
        self
    }

    /// Current contents of a playlist, in order
    pub fn playlist_contents(&self, playlist_id: &str) -> Vec<EpisodeId> {
        self.state()
            .playlists
            .get(playlist_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn show_page_calls(&self, show_id: &str) -> usize {
        self.state()
            .show_page_calls
            .get(show_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn playlist_page_calls(&self, playlist_id: &str) -> usize {
        self.state()
            .playlist_page_calls
            .get(playlist_id)
            .copied()
            .unwrap_or(0)
    }

    /// Every append call received, including rejected ones
    pub fn append_calls(&self) -> Vec<(PlaylistId, Vec<EpisodeId>)> {
        self.state().append_calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// Slice `items` according to an offset-based page request
fn page_of<T: Clone>(
    items: &[T],
    request: &PageRequest,
    cap: usize,
) -> Result<Page<T>, TransportError> {
    let offset = match &request.token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| TransportError::Decode(format!("bad page token '{}'", token)))?,
        None => 0,
    };
    let limit = request.limit.clamp(1, cap);
    let end = (offset + limit).min(items.len());
    let slice = items.get(offset..end).unwrap_or(&[]).to_vec();
    let next = (end < items.len()).then(|| end.to_string());
    Ok(Page::new(slice, next))
}

fn not_found(kind: &str, id: &str) -> TransportError {
    TransportError::Status {
        status: 404,
        body: format!("{} {} not found", kind, id),
    }
}

#[async_trait]
impl ShowEpisodeLister for InMemoryPlatform {
    async fn show_name(&self, show_id: &str) -> Result<String, TransportError> {
        let state = self.state();
        if !state.shows.contains_key(show_id) {
            return Err(not_found("show", show_id));
        }
        Ok(state
            .show_names
            .get(show_id)
            .cloned()
            .unwrap_or_else(|| show_id.to_string()))
    }

    async fn list_episodes(
        &self,
        show_id: &str,
        request: PageRequest,
    ) -> Result<Page<Episode>, TransportError> {
        let mut state = self.state();
        let calls = state.show_page_calls.entry(show_id.to_string()).or_insert(0);
        let page_index = *calls;
        *calls += 1;

        if state.failing_show_pages.get(show_id) == Some(&page_index) {
            return Err(TransportError::Status {
                status: 500,
                body: "injected show listing failure".to_string(),
            });
        }

        let episodes = state
            .shows
            .get(show_id)
            .ok_or_else(|| not_found("show", show_id))?;
        page_of(episodes, &request, MAX_EPISODE_PAGE_SIZE)
    }
}

#[async_trait]
impl PlaylistContentLister for InMemoryPlatform {
    async fn list_playlist_episodes(
        &self,
        playlist_id: &str,
        request: PageRequest,
    ) -> Result<Page<EpisodeId>, TransportError> {
        let mut state = self.state();
        *state
            .playlist_page_calls
            .entry(playlist_id.to_string())
            .or_insert(0) += 1;

        if state.failing_playlist_listings.contains(playlist_id) {
            return Err(TransportError::Request(
                "injected playlist listing failure".to_string(),
            ));
        }

        let ids = state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| not_found("playlist", playlist_id))?;
        page_of(ids, &request, MAX_PLAYLIST_PAGE_SIZE)
    }
}

#[async_trait]
impl PlaylistAppender for InMemoryPlatform {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn append(
        &self,
        playlist_id: &str,
        episode_ids: &[EpisodeId],
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        state
            .append_calls
            .push((playlist_id.to_string(), episode_ids.to_vec()));

        if episode_ids.len() > self.max_batch_size {
            return Err(TransportError::Status {
                status: 400,
                body: format!("too many items: {}", episode_ids.len()),
            });
        }

        if let Some(remaining) = state.failing_append_batches.get_mut(playlist_id) {
            if *remaining == 0 {
                return Err(TransportError::Status {
                    status: 503,
                    body: "injected append failure".to_string(),
                });
            }
            *remaining -= 1;
        }

        let playlist = state
            .playlists
            .get_mut(playlist_id)
            .ok_or_else(|| not_found("playlist", playlist_id))?;
        playlist.extend(episode_ids.iter().cloned());
        Ok(())
    }
}
