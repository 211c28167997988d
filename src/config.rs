//! Configuration file parsing
//!
//! Parses TOML configuration for the storage-node client.

use crate::cache::{CHUNK_CACHE_CAPACITY, DOWNLOAD_CACHE_CAPACITY, UPLOAD_CACHE_CAPACITY};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Storage node settings
    pub node: NodeConfig,

    /// Cache capacities
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage node settings
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Base URL of the node API
    pub url: String,

    /// Overall timeout for one request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Postage batch attached to uploads
    #[serde(default)]
    pub postage_batch_id: Option<String>,

    /// Idle pooled connections kept per host
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Requests allowed in flight at once
    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_idle_per_host() -> usize {
    16
}

fn default_max_connections_per_host() -> usize {
    64
}

impl NodeConfig {
    /// Settings for `url` with every other field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            postage_batch_id: None,
            max_idle_per_host: default_max_idle_per_host(),
            max_connections_per_host: default_max_connections_per_host(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cache capacities; zero disables a cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,

    #[serde(default = "default_upload_capacity")]
    pub upload_capacity: usize,

    #[serde(default = "default_download_capacity")]
    pub download_capacity: usize,
}

fn default_chunk_capacity() -> usize {
    CHUNK_CACHE_CAPACITY
}

fn default_upload_capacity() -> usize {
    UPLOAD_CACHE_CAPACITY
}

fn default_download_capacity() -> usize {
    DOWNLOAD_CACHE_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: CHUNK_CACHE_CAPACITY,
            upload_capacity: UPLOAD_CACHE_CAPACITY,
            download_capacity: DOWNLOAD_CACHE_CAPACITY,
        }
    }
}

impl Config {
    /// Configuration for a node URL with default settings
    pub fn for_node(url: impl Into<String>) -> Self {
        Self {
            log_level: default_log_level(),
            node: NodeConfig::new(url),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.node.url)
            .map_err(|e| ConfigError::Invalid(format!("node url {:?}: {}", self.node.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "node url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.node.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }

        if self.node.max_connections_per_host == 0 {
            return Err(ConfigError::Invalid(
                "max_connections_per_host must be positive".to_string(),
            ));
        }

        if let Some(batch) = &self.node.postage_batch_id {
            let valid = batch.len() == 64 && batch.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "postage_batch_id must be 32 bytes of hex, got {:?}",
                    batch
                )));
            }
        }

        Ok(())
    }
}
