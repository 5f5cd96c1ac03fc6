//! Remote lyrics source boundary.

use crate::error::CoreError;
use async_trait::async_trait;

/// Looks up raw lyrics text for a track.
///
/// Implementations return the payload untouched; classification into synced
/// or plain lyrics happens in [`crate::lrc::LyricsDocument::parse`] on the
/// caller's side. `Ok(None)` means no candidate carried any lyrics.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch raw lyrics for a track/artist pair.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote service is unreachable or responds
    /// with something unusable. Callers treat that the same as "not found".
    async fn lookup(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<Option<String>, CoreError>;
}
