mod display;

use overlyric_core::{Config, LyricsProvider, PlaybackSource, SyncEngine, SyncSettings};
use overlyric_lyrics_lrclib::LrclibProvider;
use overlyric_spotify::{SpotifyAuth, SpotifySource};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "overlyric::app";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config or create a template on first run.
    let config = match Config::load_or_create() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Authenticate with Spotify (cached token or browser login).
    let auth = match SpotifyAuth::new(&config.spotify) {
        Ok(auth) => Arc::new(auth),
        Err(e) => {
            error!(target: LOG_TARGET, "failed to set up spotify auth: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = auth.ensure_authenticated().await {
        error!(target: LOG_TARGET, "spotify authentication failed: {e}");
        return ExitCode::FAILURE;
    }
    info!(target: LOG_TARGET, "authenticated with spotify");

    let source: Arc<dyn PlaybackSource> = match SpotifySource::new(auth) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!(target: LOG_TARGET, "failed to create playback source: {e}");
            return ExitCode::FAILURE;
        }
    };
    let provider: Arc<dyn LyricsProvider> = match LrclibProvider::new() {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!(target: LOG_TARGET, "failed to create lyrics source: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Ctrl+C triggers a graceful shutdown of the engine and the display.
    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!(target: LOG_TARGET, "received Ctrl+C, shutting down");
        ctrlc_token.cancel();
    }) {
        error!(target: LOG_TARGET, "failed to install Ctrl+C handler: {e}");
        return ExitCode::FAILURE;
    }

    let engine = SyncEngine::new(
        source,
        provider,
        SyncSettings::from_config(&config),
        cancel.clone(),
    );
    let events = engine.subscribe();
    let engine_task = tokio::spawn(engine.run());

    display::render(events, cancel).await;
    let _ = engine_task.await;

    ExitCode::SUCCESS
}
