//! Configuration file support for the maskpaint service.
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields so deployments can inject secrets such as the
//! webhook URL without touching the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND, DEFAULT_MAX_BODY_BYTES, DEFAULT_SWEEP_INTERVAL_SECS, SESSION_TTL_SECS,
};
use crate::error::{ServiceError, ServiceResult};

/// Environment variable holding the bot webhook URL.
pub const ENV_WEBHOOK_URL: &str = "DISCORD_BOT_WEBHOOK_URL";
/// Environment variable overriding the listen address.
pub const ENV_BIND: &str = "MASKPAINT_BIND";
/// Environment variable overriding the public origin.
pub const ENV_PUBLIC_URL: &str = "MASKPAINT_PUBLIC_URL";
/// Environment variable selecting a data directory (implies filesystem storage).
pub const ENV_DATA_DIR: &str = "MASKPAINT_DATA_DIR";

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Log level setting for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Where sessions and blobs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum StorageConfig {
    /// Everything lives in process memory and is lost on restart
    #[default]
    Memory,
    /// Sessions and blobs live under a data directory
    Filesystem {
        /// Root directory; defaults to the platform data dir
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
    },
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maskpaint")
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origin used in returned URLs; derived from the Host header when unset
    #[serde(default)]
    pub public_url: Option<String>,

    /// Session and blob storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Seconds between expired-session sweeps (0 disables the sweeper)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Bot webhook notified when a mask is saved
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_session_ttl() -> u64 {
    SESSION_TTL_SECS
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_max_body() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            bind: default_bind(),
            public_url: None,
            storage: StorageConfig::default(),
            session_ttl_secs: SESSION_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            webhook_url: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_level: LogLevel::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a JSON configuration string.
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(ServiceError::invalid_request(format!(
                "Config version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            )));
        }
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> ServiceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from `path` if given, otherwise defaults, then apply the
    /// process environment.
    pub fn load(path: Option<&Path>) -> ServiceResult<Self> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_json(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_WEBHOOK_URL) {
            self.webhook_url = Some(url);
        }
        if let Some(bind) = var(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(url) = var(ENV_PUBLIC_URL) {
            self.public_url = Some(url);
        }
        if let Some(dir) = var(ENV_DATA_DIR) {
            self.storage = StorageConfig::Filesystem {
                data_dir: PathBuf::from(dir),
            };
        }
    }

    /// Public origin without a trailing slash, if configured.
    pub fn public_origin(&self) -> Option<String> {
        self.public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Info);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{
            "bind": "0.0.0.0:9000",
            "storage": { "kind": "filesystem", "data_dir": "/srv/maskpaint" },
            "log_level": "debug"
        }"#;
        let config = ServerConfig::from_json(json).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(
            config.storage,
            StorageConfig::Filesystem {
                data_dir: PathBuf::from("/srv/maskpaint")
            }
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.session_ttl_secs, SESSION_TTL_SECS);
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_newer_version_rejected() {
        assert!(ServerConfig::from_json(r#"{ "version": 99 }"#).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config.apply_env(|key| match key {
            ENV_WEBHOOK_URL => Some("http://bot/hook".to_string()),
            ENV_PUBLIC_URL => Some("https://masks.example/".to_string()),
            ENV_DATA_DIR => Some("/data".to_string()),
            ENV_BIND => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.webhook_url.as_deref(), Some("http://bot/hook"));
        assert_eq!(config.public_origin().as_deref(), Some("https://masks.example"));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert!(matches!(config.storage, StorageConfig::Filesystem { .. }));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ServerConfig::default();
        let parsed = ServerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
