use thiserror::Error;

/// Failures from the Spotify Web API integration: the OAuth flow, token
/// refresh, and currently-playing polling.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// The OAuth flow or a token exchange failed.
    #[error("spotify authentication failed: {reason}")]
    AuthFailed { reason: String },

    /// The access token was rejected (HTTP 401).
    #[error("spotify access token expired")]
    TokenExpired,

    /// No token is available; the login flow has not run yet.
    #[error("not authenticated with spotify; run the login flow first")]
    NotAuthenticated,

    /// The API answered with an unexpected status code.
    #[error("spotify api returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpotifyError>;
