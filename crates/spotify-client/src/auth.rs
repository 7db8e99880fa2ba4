//! Credentials and access tokens.
//!
//! Runs are non-interactive: a long-lived refresh token (obtained once with
//! [`authorize_url`] and [`exchange_code`]) is traded for short-lived access
//! tokens as needed. A fixed access token can be supplied instead.

use std::env;
use std::time::{Duration, Instant};

use domain::TransportError;
use reqwest::Url;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::TokenResponse;
use crate::{map_request_error, SpotifyClientError};

pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Scopes needed to read and modify the caller's playlists
pub const SCOPES: &str = "playlist-modify-public playlist-modify-private playlist-read-private";

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Application credentials read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Read `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`,
    /// `SPOTIFY_REDIRECT_URI` and `SPOTIFY_REFRESH_TOKEN`.
    pub fn from_env() -> Result<Self, SpotifyClientError> {
        Ok(Self {
            client_id: required_var("SPOTIFY_CLIENT_ID")?,
            client_secret: required_var("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: optional_var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            refresh_token: optional_var("SPOTIFY_REFRESH_TOKEN"),
        })
    }
}

fn required_var(name: &'static str) -> Result<String, SpotifyClientError> {
    optional_var(name).ok_or(SpotifyClientError::MissingEnv(name))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// URL the user opens once to grant access.
pub fn authorize_url(credentials: &Credentials) -> Result<Url, SpotifyClientError> {
    Url::parse_with_params(
        &format!("{}/authorize", DEFAULT_ACCOUNTS_BASE),
        &[
            ("client_id", credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", credentials.redirect_uri.as_str()),
            ("scope", SCOPES),
        ],
    )
    .map_err(|e| SpotifyClientError::InvalidUrl(e.to_string()))
}

/// Trade the authorization code from the redirect for tokens.
///
/// The response carries the refresh token to store in
/// `SPOTIFY_REFRESH_TOKEN`.
pub async fn exchange_code(
    http: &reqwest::Client,
    credentials: &Credentials,
    code: &str,
) -> Result<TokenResponse, TransportError> {
    request_token(
        http,
        DEFAULT_ACCOUNTS_BASE,
        credentials,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ],
    )
    .await
}

async fn request_token(
    http: &reqwest::Client,
    accounts_base: &str,
    credentials: &Credentials,
    form: &[(&str, &str)],
) -> Result<TokenResponse, TransportError> {
    let response = http
        .post(format!("{}/api/token", accounts_base))
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(form)
        .send()
        .await
        .map_err(map_request_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Auth(format!(
            "token endpoint returned {}: {}",
            status.as_u16(),
            body
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_response(response: &TokenResponse, now: Instant) -> Self {
        Self {
            value: response.access_token.clone(),
            expires_at: now + Duration::from_secs(response.expires_in),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

enum TokenSource {
    Static(String),
    Refresh {
        http: reqwest::Client,
        accounts_base: String,
        credentials: Credentials,
        refresh_token: String,
    },
}

/// Hands out a valid access token, refreshing when the cached one is
/// about to expire.
pub struct TokenProvider {
    source: TokenSource,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Always use the given token.
    pub fn from_static(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
            cached: Mutex::new(None),
        }
    }

    /// Refresh through the accounts service using the stored refresh token.
    pub fn refreshing(
        http: reqwest::Client,
        credentials: Credentials,
    ) -> Result<Self, SpotifyClientError> {
        let refresh_token = credentials
            .refresh_token
            .clone()
            .ok_or(SpotifyClientError::MissingEnv("SPOTIFY_REFRESH_TOKEN"))?;
        Ok(Self {
            source: TokenSource::Refresh {
                http,
                accounts_base: DEFAULT_ACCOUNTS_BASE.to_string(),
                credentials,
                refresh_token,
            },
            cached: Mutex::new(None),
        })
    }

    /// Point the refresh flow at another accounts host.
    pub fn with_accounts_base(mut self, base: impl Into<String>) -> Self {
        if let TokenSource::Refresh { accounts_base, .. } = &mut self.source {
            *accounts_base = base.into();
        }
        self
    }

    pub async fn access_token(&self) -> Result<String, TransportError> {
        let (http, accounts_base, credentials, refresh_token) = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Refresh {
                http,
                accounts_base,
                credentials,
                refresh_token,
            } => (http, accounts_base, credentials, refresh_token),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        debug!("Refreshing access token");
        let response = request_token(
            http,
            accounts_base,
            credentials,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
        )
        .await?;
        info!("Obtained access token valid for {}s", response.expires_in);

        let token = CachedToken::from_response(&response, Instant::now());
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}
