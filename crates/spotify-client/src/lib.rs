//! Spotify Web API client.
//!
//! This crate implements the platform traits from `sources` over HTTP:
//! - Looking up a show and listing its episodes, most recent first
//! - Listing the episodes already in a playlist
//! - Appending episodes to a playlist
//! - Access token refresh (see [`auth`])
//!
//! Every failure is reported as a [`TransportError`]: non-2xx answers keep
//! the status and body, network failures become `Request`, and bodies that
//! do not decode become `Decode`.

pub mod auth;
pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use domain::{Episode, EpisodeId, TransportError};
use serde::de::DeserializeOwned;
use sources::{
    Page, PageRequest, PlaylistAppender, PlaylistContentLister, ShowEpisodeLister,
};
use thiserror::Error;
use tracing::{debug, error};

pub use auth::{authorize_url, exchange_code, Credentials, TokenProvider};
use models::{episode_uri, AddItemsRequest, EpisodePage, PlaylistPage, Show};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Most items the add-items endpoint accepts per call
pub const MAX_APPEND_BATCH: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while setting the client up
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpotifyClientError {
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub(crate) fn map_request_error(e: reqwest::Error) -> TransportError {
    TransportError::Request(e.to_string())
}

/// HTTP client shared by all filters of a run.
pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
    tokens: TokenProvider,
}

impl SpotifyClient {
    /// Build a client around an existing token provider.
    pub fn new(http: reqwest::Client, tokens: TokenProvider) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            tokens,
        }
    }

    /// Build a client from the environment.
    ///
    /// `SPOTIFY_ACCESS_TOKEN` wins when set; otherwise the refresh-token
    /// credentials are required.
    pub fn from_env() -> Result<Self, SpotifyClientError> {
        let http = http_client()?;
        let tokens = match std::env::var("SPOTIFY_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => TokenProvider::from_static(token),
            _ => TokenProvider::refreshing(http.clone(), Credentials::from_env()?)?,
        };
        Ok(Self::new(http, tokens))
    }

    /// Point the client at another API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// A `reqwest::Client` with the timeouts used for every call.
pub fn http_client() -> Result<reqwest::Client, SpotifyClientError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SpotifyClientError::HttpClient(e.to_string()))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    error!("Request to {} failed with {}", url, status);
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Page tokens are item offsets.
fn page_query(request: &PageRequest) -> Result<Vec<(&'static str, String)>, TransportError> {
    let offset = match &request.token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| TransportError::Decode(format!("invalid page token '{}'", token)))?,
        None => 0,
    };
    Ok(vec![
        ("limit", request.limit.to_string()),
        ("offset", offset.to_string()),
    ])
}

#[async_trait]
impl ShowEpisodeLister for SpotifyClient {
    async fn show_name(&self, show_id: &str) -> Result<String, TransportError> {
        let show: Show = self.get_json(&format!("/shows/{}", show_id), &[]).await?;
        Ok(show.name)
    }

    async fn list_episodes(
        &self,
        show_id: &str,
        request: PageRequest,
    ) -> Result<Page<Episode>, TransportError> {
        let query = page_query(&request)?;
        debug!("Listing episodes of show {} ({:?})", show_id, query);
        let page: EpisodePage = self
            .get_json(&format!("/shows/{}/episodes", show_id), &query)
            .await?;
        Ok(page.into_page())
    }
}

#[async_trait]
impl PlaylistContentLister for SpotifyClient {
    async fn list_playlist_episodes(
        &self,
        playlist_id: &str,
        request: PageRequest,
    ) -> Result<Page<EpisodeId>, TransportError> {
        let mut query = page_query(&request)?;
        // Without this the API returns episodes as null tracks
        query.push(("additional_types", "episode".to_string()));
        query.push(("fields", "items(track(id,type)),next,offset".to_string()));
        debug!("Listing playlist {} ({:?})", playlist_id, query);
        let page: PlaylistPage = self
            .get_json(&format!("/playlists/{}/tracks", playlist_id), &query)
            .await?;
        Ok(page.into_page())
    }
}

#[async_trait]
impl PlaylistAppender for SpotifyClient {
    fn max_batch_size(&self) -> usize {
        MAX_APPEND_BATCH
    }

    async fn append(
        &self,
        playlist_id: &str,
        episode_ids: &[EpisodeId],
    ) -> Result<(), TransportError> {
        if episode_ids.is_empty() {
            return Ok(());
        }
        let token = self.tokens.access_token().await?;
        let body = AddItemsRequest {
            uris: episode_ids.iter().map(|id| episode_uri(id)).collect(),
        };
        debug!("Appending {} episodes to playlist {}", body.uris.len(), playlist_id);

        let response = self
            .http
            .post(format!("{}/playlists/{}/tracks", self.api_base, playlist_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_query_starts_at_zero() {
        let query = page_query(&PageRequest::first(50)).unwrap();
        assert_eq!(
            query,
            vec![("limit", "50".to_string()), ("offset", "0".to_string())]
        );
    }

    #[test]
    fn test_next_page_query_uses_token_as_offset() {
        let query = page_query(&PageRequest::next("150".to_string(), 20)).unwrap();
        assert_eq!(
            query,
            vec![("limit", "20".to_string()), ("offset", "150".to_string())]
        );
    }

    #[test]
    fn test_garbage_token_is_a_decode_error() {
        let result = page_query(&PageRequest::next("abc".to_string(), 20));
        assert!(matches!(result, Err(TransportError::Decode(_))));
    }

    #[test]
    fn test_api_base_is_normalized() {
        let client = SpotifyClient::new(reqwest::Client::new(), TokenProvider::from_static("t"))
            .with_api_base("http://localhost:9000/v1/");
        assert_eq!(client.api_base(), "http://localhost:9000/v1");
    }

    #[test]
    fn test_batch_size_matches_api_limit() {
        let client = SpotifyClient::new(reqwest::Client::new(), TokenProvider::from_static("t"));
        assert_eq!(client.max_batch_size(), 100);
    }

    #[tokio::test]
    async fn test_appending_nothing_makes_no_request() {
        // Unroutable base: any request would fail
        let client = SpotifyClient::new(reqwest::Client::new(), TokenProvider::from_static("t"))
            .with_api_base("http://127.0.0.1:1");
        assert!(client.append("pl", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_request_error() {
        let client = SpotifyClient::new(reqwest::Client::new(), TokenProvider::from_static("t"))
            .with_api_base("http://127.0.0.1:1");
        let result = client.list_episodes("show", PageRequest::first(50)).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
