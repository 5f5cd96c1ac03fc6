//! Lyrics lookups against the LRCLIB.net search API.

use async_trait::async_trait;
use overlyric_core::{CoreError, LyricsProvider};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const LOG_TARGET: &str = "overlyric::provider::lrclib";
const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: i64,
    #[serde(rename = "trackName")]
    track_name: String,
    #[serde(rename = "artistName")]
    artist_name: String,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl SearchResult {
    /// The usable lyrics text of this result, synced preferred over plain.
    /// Empty strings count as missing, matching how the API pads fields.
    fn lyrics_text(&self) -> Option<&str> {
        self.synced_lyrics
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.plain_lyrics.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Pick the result to serve for a track/artist query: the first whose track
/// and artist names both contain the queried names (case-insensitively) and
/// which carries lyrics, else the first result carrying any lyrics at all.
fn select_candidate<'a>(
    results: &'a [SearchResult],
    track_name: &str,
    artist_name: &str,
) -> Option<&'a SearchResult> {
    let track_lc = track_name.to_lowercase();
    let artist_lc = artist_name.to_lowercase();

    results
        .iter()
        .find(|r| {
            r.lyrics_text().is_some()
                && r.track_name.to_lowercase().contains(&track_lc)
                && r.artist_name.to_lowercase().contains(&artist_lc)
        })
        .or_else(|| results.iter().find(|r| r.lyrics_text().is_some()))
}

/// LRCLIB.net lyrics source
pub struct LrclibProvider {
    client: ClientWithMiddleware,
}

impl LrclibProvider {
    /// Create a new LRCLIB source with default 10-second timeout and 3
    /// retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("Overlyric/0.1 (https://github.com/overlyric/overlyric)")
            .build()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(DEFAULT_MAX_RETRIES);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client })
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn lookup(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<Option<String>, CoreError> {
        let query = format!("{track_name} {artist_name}");
        let url = format!(
            "{LRCLIB_API_URL}/search?q={}",
            urlencoding::encode(&query)
        );
        debug!(target: LOG_TARGET, "LRCLIB search: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CoreError::ProviderFailed {
                provider: self.name().to_string(),
                reason: format!("LRCLIB returned status {}", response.status()),
            });
        }

        let results: Vec<SearchResult> = response.json().await?;
        let candidate = select_candidate(&results, track_name, artist_name);

        match candidate {
            Some(result) => {
                info!(
                    target: LOG_TARGET,
                    "LRCLIB match for {} - {} (id: {})",
                    artist_name,
                    track_name,
                    result.id
                );
                Ok(result.lyrics_text().map(str::to_string))
            }
            None => {
                info!(
                    target: LOG_TARGET,
                    "LRCLIB has no lyrics for {} - {} ({} results)",
                    artist_name,
                    track_name,
                    results.len()
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(
        id: i64,
        track: &str,
        artist: &str,
        plain: Option<&str>,
        synced: Option<&str>,
    ) -> SearchResult {
        SearchResult {
            id,
            track_name: track.to_string(),
            artist_name: artist.to_string(),
            plain_lyrics: plain.map(str::to_string),
            synced_lyrics: synced.map(str::to_string),
        }
    }

    #[test]
    fn matching_result_is_preferred_over_earlier_ones() {
        let results = vec![
            result(1, "Some Song", "Someone Else", Some("wrong lyrics"), None),
            result(2, "My Song (Remastered)", "The Artist", Some("right lyrics"), None),
        ];

        let picked = select_candidate(&results, "My Song", "The Artist").unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let results = vec![result(1, "MY SONG", "THE ARTIST", Some("lyrics"), None)];
        assert!(select_candidate(&results, "my song", "the artist").is_some());
    }

    #[test]
    fn falls_back_to_first_result_with_lyrics() {
        let results = vec![
            result(1, "Unrelated", "Nobody", None, None),
            result(2, "Also Unrelated", "Nobody", Some("something"), None),
        ];

        let picked = select_candidate(&results, "My Song", "The Artist").unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn synced_is_preferred_over_plain_within_a_result() {
        let r = result(1, "Song", "Artist", Some("plain"), Some("[00:01.00]synced"));
        assert_eq!(r.lyrics_text(), Some("[00:01.00]synced"));
    }

    #[test]
    fn empty_synced_falls_back_to_plain() {
        let r = result(1, "Song", "Artist", Some("plain"), Some(""));
        assert_eq!(r.lyrics_text(), Some("plain"));
    }

    #[test]
    fn results_without_lyrics_are_skipped_entirely() {
        let results = vec![
            result(1, "Song", "Artist", None, None),
            result(2, "Song", "Artist", Some(""), Some("")),
        ];
        assert!(select_candidate(&results, "Song", "Artist").is_none());
    }

    #[test]
    fn no_results_yields_none() {
        assert!(select_candidate(&[], "Song", "Artist").is_none());
    }
}
