//! Catalog error types with the plugin id or source that caused them

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the catalog engine
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by catalog construction and queries
///
/// None of these are logged by the engine itself. They bubble up to the
/// HTTP or CLI boundary, which decides how to report them.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The registry snapshot is not a JSON array of plugin records
    #[error("Failed to parse plugin registry")]
    MalformedRegistry {
        #[source]
        source: serde_json::Error,
    },

    /// A record failed validation while building a catalog
    #[error("Invalid plugin '{plugin_id}': {reason}")]
    InvalidPlugin { plugin_id: String, reason: String },

    /// A version string is not a valid semantic version
    #[error("Invalid semantic version '{value}'")]
    InvalidVersion {
        value: String,
        #[source]
        source: semver::Error,
    },

    /// The filter's server version could not be parsed
    #[error("Invalid server version '{value}'")]
    InvalidServerVersion {
        value: String,
        #[source]
        source: semver::Error,
    },

    /// A filter parameter is out of range or failed to parse
    #[error("Invalid plugin filter: {reason}")]
    InvalidFilter { reason: String },

    /// The upstream marketplace could not be reached
    #[error("Failed to reach upstream marketplace {url}: {reason}")]
    Upstream { url: String, reason: String },

    /// The upstream marketplace answered with a non-success status
    #[error("Upstream marketplace {url} failed with status code {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// The upstream marketplace answered with a body that is not a plugin list
    #[error("Failed to decode plugins from upstream marketplace {url}")]
    UpstreamDecode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// One of the sources of a merged catalog failed
    #[error("Failed to query catalog source {index}")]
    Source {
        index: usize,
        #[source]
        source: Box<CatalogError>,
    },

    /// Configuration is missing or contradictory
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// A file backing the catalog or its configuration could not be read
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Whether the caller sent a request the catalog cannot answer.
    ///
    /// The HTTP layer maps these to `400 Bad Request`.
    pub fn is_client_error(&self) -> bool {
        match self {
            CatalogError::InvalidServerVersion { .. } | CatalogError::InvalidFilter { .. } => true,
            CatalogError::Source { source, .. } => source.is_client_error(),
            _ => false,
        }
    }

    pub(crate) fn invalid_plugin(plugin_id: &str, reason: impl Into<String>) -> Self {
        CatalogError::InvalidPlugin {
            plugin_id: plugin_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_filter(reason: impl Into<String>) -> Self {
        CatalogError::InvalidFilter {
            reason: reason.into(),
        }
    }
}
