//! Wire types of the Spotify Web API, and their conversion into pages.
//!
//! Only the fields the filter needs are modelled; serde ignores the rest.

use domain::{Episode, EpisodeId};
use serde::{Deserialize, Serialize};
use sources::Page;

/// `GET /v1/shows/{id}`
#[derive(Debug, Deserialize)]
pub struct Show {
    pub name: String,
}

/// `GET /v1/shows/{id}/episodes`
#[derive(Debug, Deserialize)]
pub struct EpisodePage {
    /// Unavailable episodes come back as `null`
    pub items: Vec<Option<RawEpisode>>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct RawEpisode {
    pub id: String,
    pub name: Option<String>,
}

/// `GET /v1/playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTrack {
    /// `null` for local files
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of `POST /v1/playlists/{id}/tracks`
#[derive(Debug, Serialize)]
pub struct AddItemsRequest {
    pub uris: Vec<String>,
}

/// `POST https://accounts.spotify.com/api/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    /// Present on code exchange, sometimes rotated on refresh
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Offset-based page token for the item following this page
fn next_token(next: &Option<String>, offset: usize, received: usize) -> Option<String> {
    next.as_ref().map(|_| (offset + received).to_string())
}

impl EpisodePage {
    pub fn into_page(self) -> Page<Episode> {
        let received = self.items.len();
        let next = next_token(&self.next, self.offset, received);
        let episodes = self
            .items
            .into_iter()
            .flatten()
            .map(|raw| Episode::with_optional_title(raw.id, raw.name))
            .collect();
        Page::filtered(episodes, received, next)
    }
}

impl PlaylistPage {
    /// Keep only episode entries; tracks, local files and nulls are dropped.
    pub fn into_page(self) -> Page<EpisodeId> {
        let received = self.items.len();
        let next = next_token(&self.next, self.offset, received);
        let ids = self
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .filter(|track| track.kind == "episode")
            .filter_map(|track| track.id)
            .collect();
        Page::filtered(ids, received, next)
    }
}

/// URI form the playlist endpoints expect
pub fn episode_uri(id: &str) -> String {
    format!("spotify:episode:{}", id)
}
