//! Remote playback source boundary.

use crate::playback::NowPlaying;
use async_trait::async_trait;
use thiserror::Error;

/// Failures a playback source can report. `AuthExpired` is kept separate so
/// the engine can run its refresh-and-retry-once policy; everything else is
/// surfaced as-is.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The credential used for polling was rejected and needs a refresh.
    #[error("playback credentials expired")]
    AuthExpired,

    /// The credential refresh itself failed.
    #[error("credential refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// Any other failure while fetching playback state.
    #[error("playback request failed: {reason}")]
    Request { reason: String },
}

/// Periodic provider of authoritative playback snapshots.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// One snapshot of what is playing right now. `Ok(None)` means the
    /// account has no active playback.
    async fn poll(&self) -> Result<Option<NowPlaying>, SourceError>;

    /// Renew the polling credential after an [`SourceError::AuthExpired`]
    /// failure.
    async fn refresh_credentials(&self) -> Result<(), SourceError>;
}
