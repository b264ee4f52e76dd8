use anyhow::Result;
use reqwest::header;
use std::time::Duration;
use tracing::debug;

use super::models::{
    AccessToken, AccessTokenResponse, AudioFeatures, AudioFeaturesResponse, BuddylistResponse,
    PlaybackResponse,
};
use crate::config::SpotifySettings;

#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    #[error("Authentication failed (status {status})")]
    Auth { status: u16 },

    #[error("Request to {url} failed (status {status})")]
    Fetch { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Access to the upstream web API surfaces used by ingestion and backfill.
///
/// All calls are blocking; jobs run on blocking worker threads.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait SpotifyClient: Send + Sync {
    /// Exchange the sp_dc session cookie for a short-lived bearer token.
    fn fetch_access_token(&self) -> Result<AccessToken, SpotifyError>;

    /// Fetch the friend activity feed.
    fn fetch_buddylist(&self, token: &AccessToken) -> Result<BuddylistResponse, SpotifyError>;

    /// Fetch the caller's current playback. `None` covers both "nothing
    /// playing" and a player endpoint that refuses the request.
    fn fetch_current_playback(
        &self,
        token: &AccessToken,
    ) -> Result<Option<PlaybackResponse>, SpotifyError>;

    /// Fetch audio features for a batch of bare track ids. The response
    /// carries `None` for ids the service does not know.
    fn fetch_audio_features(
        &self,
        token: &AccessToken,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, SpotifyError>;
}

pub struct HttpSpotifyClient {
    client: reqwest::blocking::Client,
    sp_dc: String,
    token_url: String,
    api_base_url: String,
    presence_base_url: String,
}

impl HttpSpotifyClient {
    pub fn new(settings: &SpotifySettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            sp_dc: settings.sp_dc.clone(),
            token_url: settings.token_url.clone(),
            api_base_url: settings.api_base_url.clone(),
            presence_base_url: settings.presence_base_url.clone(),
        })
    }
}

impl SpotifyClient for HttpSpotifyClient {
    fn fetch_access_token(&self) -> Result<AccessToken, SpotifyError> {
        let response = self
            .client
            .get(&self.token_url)
            .header(header::COOKIE, format!("sp_dc={}", self.sp_dc))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Auth {
                status: status.as_u16(),
            });
        }

        // A 200 without the token field is still an authentication failure,
        // the endpoint serves an HTML login page in that case.
        let body: AccessTokenResponse = response.json().map_err(|_| SpotifyError::Auth {
            status: status.as_u16(),
        })?;
        Ok(AccessToken::new(body.access_token))
    }

    fn fetch_buddylist(&self, token: &AccessToken) -> Result<BuddylistResponse, SpotifyError> {
        let url = format!("{}/presence-view/v1/buddylist", self.presence_base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Fetch {
                status: status.as_u16(),
                url,
            });
        }
        response
            .json()
            .map_err(|e| SpotifyError::Decode(e.to_string()))
    }

    fn fetch_current_playback(
        &self,
        token: &AccessToken,
    ) -> Result<Option<PlaybackResponse>, SpotifyError> {
        let url = format!("{}/v1/me/player", self.api_base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .send()?;

        // 204 means nothing is playing; any other non-200 is treated the
        // same way so a flaky player endpoint never fails the whole run.
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(status = status.as_u16(), "No playback state available");
            return Ok(None);
        }
        let playback = response
            .json()
            .map_err(|e| SpotifyError::Decode(e.to_string()))?;
        Ok(Some(playback))
    }

    fn fetch_audio_features(
        &self,
        token: &AccessToken,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, SpotifyError> {
        let url = format!("{}/v1/audio-features", self.api_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", track_ids.join(","))])
            .bearer_auth(token.secret())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Fetch {
                status: status.as_u16(),
                url,
            });
        }
        let body: AudioFeaturesResponse = response
            .json()
            .map_err(|e| SpotifyError::Decode(e.to_string()))?;
        Ok(body.audio_features)
    }
}
