//! TOML configuration loaded from the user's config directory.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Template written on first run so the user has something to fill in.
const CONFIG_TEMPLATE: &str = r#"[spotify]
# Get these from https://developer.spotify.com/dashboard
client_id = ""
client_secret = ""
redirect_uri = "http://127.0.0.1:8888/callback"
# How often to ask Spotify what is playing, in milliseconds
poll_interval_ms = 5000

[sync]
# How often the displayed line is refreshed locally, in milliseconds
tick_interval_ms = 100
# Forward bias applied to the estimated position, in milliseconds
lead_offset_ms = 500
"#;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8888/callback".into()
}

const fn default_poll_interval() -> u64 {
    5000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_lead_offset")]
    pub lead_offset_ms: u64,
}

const fn default_tick_interval() -> u64 {
    100
}

const fn default_lead_offset() -> u64 {
    500
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            lead_offset_ms: default_lead_offset(),
        }
    }
}

impl Config {
    /// Get the config file path (~/.config/overlyric/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create a template on first run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or
    /// an error when the file cannot be read, parsed, or validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.spotify.client_id.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "spotify.client_id".into(),
            });
        }
        if self.spotify.client_secret.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "spotify.client_secret".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
[spotify]
client_id = "abc"
client_secret = "def"
"#,
        )
        .unwrap();

        assert_eq!(config.spotify.redirect_uri, "http://127.0.0.1:8888/callback");
        assert_eq!(config.spotify.poll_interval_ms, 5000);
        assert_eq!(config.sync.tick_interval_ms, 100);
        assert_eq!(config.sync.lead_offset_ms, 500);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = toml::from_str(
            r#"
[spotify]
client_id = "abc"
client_secret = "def"
poll_interval_ms = 2000

[sync]
tick_interval_ms = 50
lead_offset_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.spotify.poll_interval_ms, 2000);
        assert_eq!(config.sync.tick_interval_ms, 50);
        assert_eq!(config.sync.lead_offset_ms, 250);
    }

    #[test]
    fn empty_credentials_fail_validation() {
        let config: Config = toml::from_str(
            r#"
[spotify]
client_id = ""
client_secret = "def"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(CoreError::ConfigMissingField { field }) if field == "spotify.client_id"
        ));
    }

    #[test]
    fn template_parses_back() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(config.spotify.client_id.is_empty());
        assert_eq!(config.sync.lead_offset_ms, 500);
    }
}
