//! Terminal rendering of engine display events.

use overlyric_core::{format_mm_ss, DisplayEvent, LyricsDocument};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const LOG_TARGET: &str = "overlyric::display";

/// Placeholder printed for instrumental/pause lines.
const PAUSE_MARKER: &str = "♪";

/// Consume display events until the channel closes or shutdown is requested.
pub async fn render(mut events: broadcast::Receiver<DisplayEvent>, cancel: CancellationToken) {
    // Kept so line transitions can be resolved back to their text.
    let mut lyrics: Option<Arc<LyricsDocument>> = None;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => show(event, &mut lyrics),
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(target: LOG_TARGET, "display fell behind by {n} events");
                }
            },
        }
    }
}

fn show(event: DisplayEvent, lyrics: &mut Option<Arc<LyricsDocument>>) {
    match event {
        DisplayEvent::Status(text) => println!("* {text}"),
        DisplayEvent::SongInfo {
            track_name,
            artist_name,
            album_name,
            duration_ms,
            position_ms,
            is_playing,
        } => {
            let state = if is_playing { "playing" } else { "paused" };
            println!(
                "> {track_name} - {artist_name} [{album_name}] {} / {} ({state})",
                format_mm_ss(position_ms),
                format_mm_ss(duration_ms),
            );
        }
        DisplayEvent::LyricsReady(document) => {
            match document.as_ref() {
                LyricsDocument::Synced(lines) => {
                    println!("* Lyrics loaded ({} lines)", lines.len());
                }
                LyricsDocument::Plain(text) => {
                    println!("* Lyrics (untimed):");
                    println!("{text}");
                }
                LyricsDocument::Absent => {
                    println!("* Lyrics not found for this song.");
                }
            }
            *lyrics = Some(document);
        }
        DisplayEvent::LineChanged(index) => {
            let Some(document) = lyrics.as_ref() else {
                return;
            };
            let Some(lines) = document.synced_lines() else {
                return;
            };
            if let Some(line) = index.and_then(|i| lines.get(i)) {
                if line.text.is_empty() {
                    println!("  {PAUSE_MARKER}");
                } else {
                    println!("  {}", line.text);
                }
            }
        }
        DisplayEvent::FetchingLyrics => println!("* Fetching lyrics..."),
        DisplayEvent::NothingPlaying => {
            *lyrics = None;
            println!("* No song is currently playing");
        }
    }
}
