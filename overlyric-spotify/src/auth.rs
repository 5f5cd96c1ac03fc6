//! Spotify OAuth: interactive authorization-code login, token persistence,
//! and refresh.

use crate::error::{Result, SpotifyError};
use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, TimeDelta, Utc};
use overlyric_core::SpotifyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info, warn};
use url::Url;

const LOG_TARGET: &str = "overlyric::spotify::auth";

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SCOPES: &str = "user-read-playback-state";

/// Timeout for the interactive OAuth callback (10 minutes)
const CALLBACK_TIMEOUT_SECS: u64 = 600;

/// Fallback token lifetime when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const CALLBACK_RESPONSE_HTML: &str = "<html><body>\
<h1>Authentication successful!</h1>\
<p>You can close this window and return to overlyric.</p>\
</body></html>";

/// Token pair persisted under the config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Token endpoint response for both the code exchange and the refresh grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// Manages the Spotify credential for the playback source.
pub struct SpotifyAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
    token: RwLock<Option<StoredToken>>,
    token_path: PathBuf,
}

impl SpotifyAuth {
    /// Create an auth manager from the `[spotify]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SpotifyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http,
            token: RwLock::new(None),
            token_path: overlyric_core::token_cache_path(),
        })
    }

    /// The current access token.
    ///
    /// # Errors
    ///
    /// Returns [`SpotifyError::NotAuthenticated`] when no login has happened.
    pub async fn access_token(&self) -> Result<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or(SpotifyError::NotAuthenticated)
    }

    /// Make sure a usable token is in place: a cached one when available,
    /// otherwise the interactive browser login.
    ///
    /// # Errors
    ///
    /// Returns an error when both the cached token and the interactive flow
    /// fail to produce a credential.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.load_cached_token().await? {
            info!(target: LOG_TARGET, "using cached spotify token");
            return Ok(());
        }
        self.login().await
    }

    /// Try to load the persisted token; refresh it when it has expired.
    async fn load_cached_token(&self) -> Result<bool> {
        if !self.token_path.exists() {
            debug!(target: LOG_TARGET, "no cached token at {:?}", self.token_path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.token_path)?;
        let stored: StoredToken = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(target: LOG_TARGET, "discarding unreadable token cache: {e}");
                return Ok(false);
            }
        };

        let expired = stored.is_expired();
        *self.token.write().await = Some(stored);

        if expired {
            info!(target: LOG_TARGET, "cached token expired, refreshing");
            if let Err(e) = self.refresh().await {
                warn!(target: LOG_TARGET, "cached token refresh failed: {e}");
                *self.token.write().await = None;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run the interactive authorization-code flow: open the browser, wait
    /// for the callback on the redirect URI, exchange the code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error when the browser cannot be opened, the callback
    /// never arrives, or the code exchange fails.
    pub async fn login(&self) -> Result<()> {
        let authorize_url = self.authorize_url();
        info!(target: LOG_TARGET, "opening browser for spotify login");
        if open::that(&authorize_url).is_err() {
            // Headless fallback: the user can still follow the link by hand.
            info!(target: LOG_TARGET, "open this URL to authorize: {authorize_url}");
        }

        let code = self.wait_for_callback().await?;
        self.exchange_code(&code).await?;
        info!(target: LOG_TARGET, "spotify login complete");
        Ok(())
    }

    /// The authorization URL the user is sent to.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?response_type=code&client_id={}&scope={}&redirect_uri={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(SCOPES),
            urlencoding::encode(&self.redirect_uri),
        )
    }

    /// Serve the redirect URI until the authorization code arrives.
    async fn wait_for_callback(&self) -> Result<String> {
        let redirect = Url::parse(&self.redirect_uri).map_err(|e| SpotifyError::AuthFailed {
            reason: format!("invalid redirect uri: {e}"),
        })?;
        let port = redirect.port().unwrap_or(80);
        let path = redirect.path().to_string();

        let (code_tx, code_rx) = oneshot::channel::<Result<String>>();
        let code_tx = Arc::new(Mutex::new(Some(code_tx)));

        let app = Router::new().route(
            &path,
            get(move |Query(params): Query<CallbackParams>| {
                let code_tx = Arc::clone(&code_tx);
                async move {
                    let outcome = match (params.code, params.error) {
                        (Some(code), _) => Ok(code),
                        (None, Some(error)) => Err(SpotifyError::AuthFailed {
                            reason: format!("authorization denied: {error}"),
                        }),
                        (None, None) => Err(SpotifyError::AuthFailed {
                            reason: "callback carried no code".to_string(),
                        }),
                    };
                    if let Some(tx) = code_tx.lock().ok().and_then(|mut guard| guard.take()) {
                        let _ = tx.send(outcome);
                    }
                    Html(CALLBACK_RESPONSE_HTML)
                }
            }),
        );

        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        debug!(target: LOG_TARGET, "callback server listening on {addr}");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(CALLBACK_TIMEOUT_SECS),
            code_rx,
        )
        .await;
        server.abort();

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SpotifyError::AuthFailed {
                reason: "callback server closed unexpectedly".to_string(),
            }),
            Err(_) => Err(SpotifyError::AuthFailed {
                reason: "timed out waiting for the login callback".to_string(),
            }),
        }
    }

    /// Exchange an authorization code for a token pair.
    async fn exchange_code(&self, code: &str) -> Result<()> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpotifyError::AuthFailed {
                reason: format!("token exchange returned status {}", response.status()),
            });
        }

        let payload: TokenResponse = response.json().await?;
        let refresh_token = payload.refresh_token.ok_or_else(|| SpotifyError::AuthFailed {
            reason: "token exchange returned no refresh token".to_string(),
        })?;

        let stored = StoredToken {
            access_token: payload.access_token,
            refresh_token,
            expires_at: expires_at_from(payload.expires_in),
        };
        *self.token.write().await = Some(stored);
        self.save_token().await
    }

    /// Trade the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error when no refresh token is stored or the refresh grant
    /// is rejected.
    pub async fn refresh(&self) -> Result<()> {
        let refresh_token = self
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(SpotifyError::NotAuthenticated)?;

        info!(target: LOG_TARGET, "refreshing spotify access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpotifyError::AuthFailed {
                reason: format!("token refresh returned status {}", response.status()),
            });
        }

        let payload: TokenResponse = response.json().await?;
        let stored = StoredToken {
            access_token: payload.access_token,
            // Spotify only rotates the refresh token occasionally.
            refresh_token: payload.refresh_token.unwrap_or(refresh_token),
            expires_at: expires_at_from(payload.expires_in),
        };
        *self.token.write().await = Some(stored);
        self.save_token().await
    }

    async fn save_token(&self) -> Result<()> {
        let guard = self.token.read().await;
        let Some(token) = guard.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.token_path, content)?;
        debug!(target: LOG_TARGET, "saved token to {:?}", self.token_path);
        Ok(())
    }
}

fn expires_at_from(expires_in: Option<i64>) -> DateTime<Utc> {
    Utc::now() + TimeDelta::seconds(expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS))
}
