use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config file not found at {path}; a template has been written - fill in your Spotify credentials and restart")]
    ConfigNotFound { path: PathBuf },

    #[error("missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("lyrics provider {provider} failed: {reason}")]
    ProviderFailed { provider: String, reason: String },

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("http client error: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
