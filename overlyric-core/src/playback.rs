//! Playback snapshots and local position extrapolation.

use crate::time::millis_to_secs;
use std::time::Instant;

/// One authoritative snapshot of remote playback state, as delivered by a
/// single poll of the playback source.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
}

impl NowPlaying {
    /// Reported playback offset in seconds.
    #[must_use]
    pub fn position_seconds(&self) -> f64 {
        millis_to_secs(self.position_ms)
    }
}

/// Anchor-based estimate of the current position within a track.
///
/// The remote service only reports its position every few seconds, so the
/// estimate extrapolates from the last reported (wall time, position) pair.
/// The anchor is replaced wholesale on every new snapshot and never adjusted
/// incrementally, which keeps drift from accumulating across updates.
#[derive(Debug, Clone)]
pub struct PlaybackEstimate {
    pub track_id: String,
    anchor_wall_time: Instant,
    anchor_position_seconds: f64,
    pub is_playing: bool,
}

impl PlaybackEstimate {
    /// Build a fresh anchor from an authoritative snapshot.
    #[must_use]
    pub fn reset(
        track_id: impl Into<String>,
        position_seconds: f64,
        is_playing: bool,
        now: Instant,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            anchor_wall_time: now,
            anchor_position_seconds: position_seconds,
            is_playing,
        }
    }

    /// Estimated playback position at `now`, in seconds.
    ///
    /// While paused the anchor position is returned unchanged regardless of
    /// elapsed wall time. No clamping to track duration is applied; near the
    /// end of a track the estimate may slightly exceed it, and display
    /// formatting is expected to cope.
    #[must_use]
    pub fn estimate(&self, now: Instant) -> f64 {
        if !self.is_playing {
            return self.anchor_position_seconds;
        }
        let elapsed = now.saturating_duration_since(self.anchor_wall_time);
        self.anchor_position_seconds + elapsed.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(position_ms: u64, is_playing: bool) -> NowPlaying {
        NowPlaying {
            track_id: "track-1".to_string(),
            track_name: "Song".to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            position_ms,
            duration_ms: 180_000,
            is_playing,
        }
    }

    #[test]
    fn position_seconds_converts_millis() {
        assert!((snapshot(12_340, true).position_seconds() - 12.34).abs() < 1e-9);
    }

    #[test]
    fn estimate_advances_with_wall_time_while_playing() {
        let start = Instant::now();
        let est = PlaybackEstimate::reset("track-1", 30.0, true, start);
        let later = start + Duration::from_secs(2);
        assert!((est.estimate(later) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn estimate_is_constant_while_paused() {
        let start = Instant::now();
        let est = PlaybackEstimate::reset("track-1", 30.0, false, start);
        let much_later = start + Duration::from_secs(3600);
        assert!((est.estimate(much_later) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn estimate_is_idempotent_for_a_fixed_now() {
        let start = Instant::now();
        let est = PlaybackEstimate::reset("track-1", 10.0, true, start);
        let at = start + Duration::from_millis(1500);
        assert!((est.estimate(at) - est.estimate(at)).abs() < f64::EPSILON);
    }

    #[test]
    fn estimate_may_exceed_track_duration() {
        let start = Instant::now();
        // Anchored 2 seconds before the end of a 180 second track.
        let est = PlaybackEstimate::reset("track-1", 178.0, true, start);
        let later = start + Duration::from_secs(10);
        assert!(est.estimate(later) > 180.0);
    }

    #[test]
    fn wall_time_regression_saturates_to_anchor() {
        let start = Instant::now() + Duration::from_secs(100);
        let est = PlaybackEstimate::reset("track-1", 30.0, true, start);
        // `now` earlier than the anchor yields the anchor position.
        assert!((est.estimate(Instant::now()) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reset_replaces_the_anchor_wholesale() {
        let start = Instant::now();
        let est = PlaybackEstimate::reset("track-1", 30.0, true, start);
        let later = start + Duration::from_secs(5);
        let est = PlaybackEstimate::reset(est.track_id, 31.0, true, later);
        // The old anchor contributes nothing; only the new pair counts.
        assert!((est.estimate(later) - 31.0).abs() < 1e-9);
    }
}
