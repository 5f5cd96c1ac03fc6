//! Currently-playing polling against the Spotify Web API.

use crate::auth::SpotifyAuth;
use crate::error::SpotifyError;
use async_trait::async_trait;
use overlyric_core::{NowPlaying, PlaybackSource, SourceError};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const LOG_TARGET: &str = "overlyric::spotify::source";

const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

#[derive(Debug, Deserialize)]
struct CurrentlyPlayingResponse {
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    // Local files report a null id; such items are treated as nothing
    // playing since they cannot be keyed or looked up.
    id: Option<String>,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<ArtistItem>,
    album: Option<AlbumItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumItem {
    name: String,
}

fn map_payload(payload: CurrentlyPlayingResponse) -> Option<NowPlaying> {
    let item = payload.item?;
    let track_id = item.id?;
    let artist_name = item
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Some(NowPlaying {
        track_id,
        track_name: item.name,
        artist_name,
        album_name: item.album.map(|a| a.name).unwrap_or_default(),
        position_ms: payload.progress_ms.unwrap_or(0),
        duration_ms: item.duration_ms,
        is_playing: payload.is_playing,
    })
}

/// Playback source backed by the Spotify currently-playing endpoint.
pub struct SpotifySource {
    auth: Arc<SpotifyAuth>,
    http: reqwest::Client,
}

impl SpotifySource {
    /// Create a source sharing an authenticated credential manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(auth: Arc<SpotifyAuth>) -> Result<Self, SpotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { auth, http })
    }

    async fn fetch_now_playing(&self) -> Result<Option<NowPlaying>, SpotifyError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(CURRENTLY_PLAYING_URL)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            // Nothing is playing on any device.
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::UNAUTHORIZED => Err(SpotifyError::TokenExpired),
            status if status.is_success() => {
                let payload: CurrentlyPlayingResponse = response.json().await?;
                let now_playing = map_payload(payload);
                debug!(
                    target: LOG_TARGET,
                    "polled spotify: {:?}",
                    now_playing.as_ref().map(|n| (&n.track_name, n.position_ms))
                );
                Ok(now_playing)
            }
            status => Err(SpotifyError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }
}

impl From<SpotifyError> for SourceError {
    fn from(e: SpotifyError) -> Self {
        match e {
            SpotifyError::TokenExpired => Self::AuthExpired,
            other => Self::Request {
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl PlaybackSource for SpotifySource {
    async fn poll(&self) -> Result<Option<NowPlaying>, SourceError> {
        self.fetch_now_playing().await.map_err(SourceError::from)
    }

    async fn refresh_credentials(&self) -> Result<(), SourceError> {
        self.auth.refresh().await.map_err(|e| SourceError::RefreshFailed {
            reason: e.to_string(),
        })
    }
}
