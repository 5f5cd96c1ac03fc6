//! The synchronization engine: one serialized loop that ties authoritative
//! playback samples, asynchronous lyrics lookups, and the local display tick
//! together.
//!
//! All engine state lives behind a single task. The poll interval, the tick
//! interval, and resolved lookups all enter through the same `select!` loop,
//! so no two of them ever mutate the estimate or cursor concurrently.
//! Lookups run on spawned tasks and report back over a channel rather than
//! touching state from the background.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SessionCache;
use crate::config::Config;
use crate::cursor::{LyricsCursor, DEFAULT_LEAD_OFFSET_SECS};
use crate::lrc::LyricsDocument;
use crate::playback::{NowPlaying, PlaybackEstimate};
use crate::provider::LyricsProvider;
use crate::source::{PlaybackSource, SourceError};
use crate::time::millis_to_secs;

const LOG_TARGET: &str = "overlyric::sync";

/// Capacity of the display event channel; slow subscribers lag rather than
/// block the engine.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events pushed to display subscribers.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// Free-form status line, also used for user-visible errors.
    Status(String),
    /// Track metadata refreshed from an authoritative sample.
    SongInfo {
        track_name: String,
        artist_name: String,
        album_name: String,
        duration_ms: u64,
        position_ms: u64,
        is_playing: bool,
    },
    /// Lyrics for the active track were installed (possibly `Absent`).
    LyricsReady(Arc<LyricsDocument>),
    /// The current line moved; `None` means back before the first line.
    LineChanged(Option<usize>),
    /// A remote lyrics lookup is in flight for the active track.
    FetchingLyrics,
    /// Playback stopped remotely.
    NothingPlaying,
}

/// Timing knobs for the engine.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// How often the playback source is polled for an authoritative sample.
    pub poll_interval: Duration,
    /// How often the displayed line is refreshed from the local estimate.
    pub tick_interval: Duration,
    /// Forward bias applied to the estimated position before line lookup.
    pub lead_offset_seconds: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            tick_interval: Duration::from_millis(100),
            lead_offset_seconds: DEFAULT_LEAD_OFFSET_SECS,
        }
    }
}

impl SyncSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.spotify.poll_interval_ms),
            tick_interval: Duration::from_millis(config.sync.tick_interval_ms),
            lead_offset_seconds: millis_to_secs(config.sync.lead_offset_ms),
        }
    }
}

/// A lyrics lookup that came back, tagged with the track it was issued for.
struct ResolvedLyrics {
    track_id: String,
    document: LyricsDocument,
}

/// Orchestrates playback tracking and lyrics display for one session.
pub struct SyncEngine {
    source: Arc<dyn PlaybackSource>,
    provider: Arc<dyn LyricsProvider>,
    settings: SyncSettings,
    cancel: CancellationToken,

    cache: SessionCache,
    active_track_id: Option<String>,
    estimate: Option<PlaybackEstimate>,
    cursor: LyricsCursor,
    document: Option<Arc<LyricsDocument>>,

    events: broadcast::Sender<DisplayEvent>,
    resolved_tx: mpsc::Sender<ResolvedLyrics>,
    resolved_rx: Option<mpsc::Receiver<ResolvedLyrics>>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        source: Arc<dyn PlaybackSource>,
        provider: Arc<dyn LyricsProvider>,
        settings: SyncSettings,
        cancel: CancellationToken,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (resolved_tx, resolved_rx) = mpsc::channel(8);
        let cursor = LyricsCursor::new(settings.lead_offset_seconds);
        Self {
            source,
            provider,
            settings,
            cancel,
            cache: SessionCache::new(),
            active_track_id: None,
            estimate: None,
            cursor,
            document: None,
            events,
            resolved_tx,
            resolved_rx: Some(resolved_rx),
        }
    }

    /// Subscribe to display events. Subscribers that fall behind observe a
    /// lag error rather than blocking the engine.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.events.subscribe()
    }

    /// Run until the cancellation token fires.
    pub async fn run(mut self) {
        let Some(mut resolved_rx) = self.resolved_rx.take() else {
            return;
        };
        info!(
            target: LOG_TARGET,
            "starting sync engine (poll every {:?}, tick every {:?})",
            self.settings.poll_interval,
            self.settings.tick_interval,
        );

        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick = tokio::time::interval(self.settings.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(target: LOG_TARGET, "sync engine shutting down");
                    break;
                }
                _ = poll.tick() => {
                    match self.fetch_sample().await {
                        Ok(sample) => self.handle_sample(sample, Instant::now()),
                        Err(e) => {
                            warn!(target: LOG_TARGET, "playback poll failed: {e}");
                            self.emit(DisplayEvent::Status(format!(
                                "Error fetching playback state: {e}"
                            )));
                        }
                    }
                }
                _ = tick.tick() => {
                    self.handle_tick(Instant::now());
                }
                resolved = resolved_rx.recv() => {
                    if let Some(resolved) = resolved {
                        self.handle_resolved(resolved);
                    }
                }
            }
        }
    }

    /// Poll the playback source, allowing one credential refresh followed by
    /// one retry when the credential has expired. Any second failure is
    /// returned to the caller; engine state stays untouched either way.
    async fn fetch_sample(&self) -> Result<Option<NowPlaying>, SourceError> {
        match self.source.poll().await {
            Err(SourceError::AuthExpired) => {
                info!(target: LOG_TARGET, "playback credentials expired, refreshing");
                self.source.refresh_credentials().await?;
                self.source.poll().await
            }
            other => other,
        }
    }

    /// Apply one authoritative sample.
    fn handle_sample(&mut self, sample: Option<NowPlaying>, now: Instant) {
        let Some(sample) = sample else {
            self.enter_idle();
            return;
        };

        // Nothing tracked yet and the account is paused: stay idle.
        if self.active_track_id.is_none() && !sample.is_playing {
            return;
        }

        self.emit(DisplayEvent::SongInfo {
            track_name: sample.track_name.clone(),
            artist_name: sample.artist_name.clone(),
            album_name: sample.album_name.clone(),
            duration_ms: sample.duration_ms,
            position_ms: sample.position_ms,
            is_playing: sample.is_playing,
        });

        let track_changed = self.active_track_id.as_deref() != Some(sample.track_id.as_str());

        // Every sample re-anchors the estimate wholesale.
        self.estimate = Some(PlaybackEstimate::reset(
            sample.track_id.clone(),
            sample.position_seconds(),
            sample.is_playing,
            now,
        ));

        if !track_changed {
            return;
        }

        info!(
            target: LOG_TARGET,
            "track changed: {} - {}", sample.artist_name, sample.track_name
        );
        self.active_track_id = Some(sample.track_id.clone());
        self.cursor.reset();
        self.document = None;
        self.emit(DisplayEvent::Status(format!(
            "Now playing: {} by {}",
            sample.track_name, sample.artist_name
        )));

        if let Some(cached) = self.cache.get(&sample.track_id) {
            debug!(target: LOG_TARGET, "using cached lyrics for {}", sample.track_id);
            self.install(cached);
        } else {
            self.emit(DisplayEvent::FetchingLyrics);
            self.spawn_lookup(&sample);
        }
    }

    /// Refresh the displayed line from the local estimate.
    fn handle_tick(&mut self, now: Instant) {
        let Some(estimate) = &self.estimate else {
            return;
        };
        if !estimate.is_playing {
            return;
        }
        let Some(document) = self.document.clone() else {
            return;
        };
        let Some(lines) = document.synced_lines() else {
            return;
        };

        let position = estimate.estimate(now);
        let (index, changed) = self.cursor.advance(lines, position);
        if changed {
            self.emit(DisplayEvent::LineChanged(index));
        }
    }

    /// Install a lookup result, unless the listener has moved on to another
    /// track in the meantime. Stale results are still cached (they are valid
    /// data for their track) but never shown.
    fn handle_resolved(&mut self, resolved: ResolvedLyrics) {
        let document = Arc::new(resolved.document);
        self.cache
            .put(resolved.track_id.clone(), Arc::clone(&document));

        if self.active_track_id.as_deref() != Some(resolved.track_id.as_str()) {
            debug!(
                target: LOG_TARGET,
                "discarding stale lyrics result for {}", resolved.track_id
            );
            return;
        }
        self.install(document);
    }

    fn install(&mut self, document: Arc<LyricsDocument>) {
        self.document = Some(Arc::clone(&document));
        self.emit(DisplayEvent::LyricsReady(document));
    }

    fn enter_idle(&mut self) {
        if self.active_track_id.is_none() {
            return;
        }
        info!(target: LOG_TARGET, "playback stopped");
        self.active_track_id = None;
        self.estimate = None;
        self.cursor.reset();
        self.document = None;
        self.emit(DisplayEvent::NothingPlaying);
    }

    /// Kick off a remote lookup on its own task; the result re-enters the
    /// engine through the resolved channel. Lookup failures are logged and
    /// resolved as `Absent` so a flaky provider is not hammered on every
    /// sample.
    fn spawn_lookup(&self, sample: &NowPlaying) {
        let provider = Arc::clone(&self.provider);
        let tx = self.resolved_tx.clone();
        let track_id = sample.track_id.clone();
        let track_name = sample.track_name.clone();
        let artist_name = sample.artist_name.clone();

        tokio::spawn(async move {
            let document = match provider.lookup(&track_name, &artist_name).await {
                Ok(Some(raw)) => LyricsDocument::parse(&raw),
                Ok(None) => {
                    info!(
                        target: LOG_TARGET,
                        "no lyrics found for {} - {}", artist_name, track_name
                    );
                    LyricsDocument::Absent
                }
                Err(e) => {
                    warn!(
                        target: LOG_TARGET,
                        "lyrics lookup failed for {} - {}: {e}", artist_name, track_name
                    );
                    LyricsDocument::Absent
                }
            };
            let _ = tx.send(ResolvedLyrics { track_id, document }).await;
        });
    }

    fn emit(&self, event: DisplayEvent) {
        // Send fails only when nobody subscribed, which is fine.
        let _ = self.events.send(event);
    }
}
