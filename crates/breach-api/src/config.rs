//! Startup configuration.
//!
//! Read once: an optional YAML file named by `BREACH_CONFIG`, then
//! environment variables on top of it.
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_TEMPLATES_PATH: &str = "templates/pages.yaml";
/// Matches the backend's own upload limit
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONFIG/backend_url is required (set BREACH_BACKEND_URL)")]
    MissingBackendUrl,

    #[error("CONFIG/{key}: expected a positive integer, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("CONFIG/cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("CONFIG/cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the analysis backend, without trailing slash
    pub backend_url: String,
    pub listen_addr: String,
    pub templates_path: String,
    pub max_upload_bytes: usize,
    /// Results older than this are swept; `None` keeps them until consumed
    pub cache_max_age: Option<Duration>,
    pub sweep_interval: Duration,
}

/// Shape of the optional YAML file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    backend_url: Option<String>,
    listen_addr: Option<String>,
    templates_path: Option<String>,
    max_upload_bytes: Option<usize>,
    cache_max_age_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

impl FileConfig {
    fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match lookup("BREACH_CONFIG") {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };

        let backend_url = lookup("BREACH_BACKEND_URL")
            .or(file.backend_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;

        let listen_addr = lookup("BREACH_ADDR")
            .or(file.listen_addr)
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let templates_path = lookup("BREACH_TEMPLATES")
            .or(file.templates_path)
            .unwrap_or_else(|| DEFAULT_TEMPLATES_PATH.to_string());

        let max_upload_bytes = match lookup("BREACH_MAX_UPLOAD_BYTES") {
            Some(raw) => positive("BREACH_MAX_UPLOAD_BYTES", &raw)? as usize,
            None => file.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        let cache_max_age_secs = match lookup("BREACH_CACHE_MAX_AGE_SECS") {
            Some(raw) => Some(positive("BREACH_CACHE_MAX_AGE_SECS", &raw)?),
            None => file.cache_max_age_secs,
        };

        let sweep_interval_secs = match lookup("BREACH_SWEEP_INTERVAL_SECS") {
            Some(raw) => positive("BREACH_SWEEP_INTERVAL_SECS", &raw)?,
            None => file.sweep_interval_secs.unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        };
        if sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "sweep_interval_secs".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            backend_url,
            listen_addr,
            templates_path,
            max_upload_bytes,
            cache_max_age: cache_max_age_secs.map(Duration::from_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        })
    }
}

fn positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        })
}
