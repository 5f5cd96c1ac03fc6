pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod lrc;
pub mod paths;
pub mod playback;
pub mod provider;
pub mod source;
pub mod sync;
pub mod time;

pub use cache::SessionCache;
pub use config::{Config, SpotifyConfig, SyncConfig};
pub use cursor::LyricsCursor;
pub use error::{CoreError, Result};
pub use lrc::{LyricsDocument, LyricsLine};
pub use paths::{config_dir, config_path, token_cache_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{NowPlaying, PlaybackEstimate};
pub use provider::LyricsProvider;
pub use source::{PlaybackSource, SourceError};
pub use sync::{DisplayEvent, SyncEngine, SyncSettings};
pub use time::{format_mm_ss, millis_to_secs};
