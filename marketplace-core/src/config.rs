//! Catalog and server configuration
//!
//! Configuration is loaded once at startup and passed explicitly to the
//! catalogs and the HTTP surface. Nothing here is process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CatalogError, Result};
use crate::version::PluginVersion;

/// Servers below this version predate the enterprise flag
pub const DEFAULT_ENTERPRISE_FLAG_MIN_SERVER_VERSION: &str = "5.25.0";

/// Default location of the registry snapshot
pub const DEFAULT_DATABASE: &str = "plugins.json";

/// Default listen address for the HTTP surface
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8085";

/// Default timeout for requests to upstream marketplaces
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Settings that shape the query algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Enterprise-only plugins are hidden from servers at or above this
    /// version unless they opt in. Older servers, and requests without a
    /// server version, always see them.
    pub enterprise_flag_min_server_version: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enterprise_flag_min_server_version: DEFAULT_ENTERPRISE_FLAG_MIN_SERVER_VERSION
                .to_string(),
        }
    }
}

impl CatalogConfig {
    /// Parse the enterprise threshold
    pub fn enterprise_threshold(&self) -> Result<PluginVersion> {
        PluginVersion::parse(&self.enterprise_flag_min_server_version).map_err(|e| {
            CatalogError::Config {
                reason: format!("enterprise_flag_min_server_version: {e}"),
            }
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.enterprise_threshold().map(|_| ())
    }
}

/// Configuration file shared by the `server`, `query` and `validate` commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Registry snapshot served by the local catalog
    pub database: PathBuf,

    pub listen: String,

    /// Base URLs of remote marketplaces merged after the local catalog
    pub upstreams: Vec<String>,

    pub upstream_timeout_seconds: u64,

    pub catalog: CatalogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            listen: DEFAULT_LISTEN.to_string(),
            upstreams: Vec::new(),
            upstream_timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            catalog: CatalogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Load configuration from a YAML file, falling back to defaults if it does not exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml_ng::from_str(&content).map_err(|e| CatalogError::Config {
            reason: format!("failed to parse {}: {e}", path.display()),
        })?;
        config.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/marketplace/config.yaml`
    pub fn default_path() -> Result<PathBuf> {
        directories::ProjectDirs::from("com", "mattermost", "marketplace")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .ok_or_else(|| CatalogError::Config {
                reason: "could not determine config directory".to_string(),
            })
    }

    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        for upstream in &self.upstreams {
            if !upstream.starts_with("http://") && !upstream.starts_with("https://") {
                return Err(CatalogError::Config {
                    reason: format!("upstream URL must start with http:// or https://: {upstream}"),
                });
            }
        }
        Ok(())
    }

    /// Timeout for upstream requests, never shorter than one second
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds.max(1))
    }
}

/// Build and instance details reported by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub release_id: String,
    pub build_hash: String,
    pub build_hash_short: String,
    pub description: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        let build_hash = option_env!("MARKETPLACE_BUILD_HASH").unwrap_or_default();
        Self {
            release_id: env!("CARGO_PKG_VERSION").to_string(),
            build_hash: build_hash.to_string(),
            build_hash_short: build_hash.chars().take(7).collect(),
            description: "The stateless HTTP service backing the plugin marketplace".to_string(),
        }
    }
}
