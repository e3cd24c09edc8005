//! Query parameters that constrain a catalog lookup

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// `per_page` sentinel requesting every match, unpaged
pub const ALL_PER_PAGE: i64 = -1;

/// Page size used by the HTTP surface when `per_page` is absent
pub const DEFAULT_PER_PAGE: i64 = 100;

/// Parameters used to constrain a set of plugins
///
/// Every field defaults to "no constraint": the default filter returns the
/// latest version of every plugin, unpaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginFilter {
    pub page: i64,

    /// Page size; [`ALL_PER_PAGE`] returns everything, `0` returns nothing
    pub per_page: i64,

    /// Free-text search over id, name and description
    pub filter: String,

    /// Version of the requesting server; empty skips compatibility checks
    pub server_version: String,

    /// Whether the requesting server wants enterprise-only plugins
    pub enterprise_plugins: bool,

    /// Whether the requesting server is cloud hosted
    pub cloud: bool,

    /// Platform key such as `linux-amd64`, selecting platform-specific bundles
    pub platform: String,

    /// Restrict results to one plugin id
    pub plugin_id: String,

    /// Return every eligible version instead of only the latest per plugin
    pub return_all_versions: bool,
}

impl Default for PluginFilter {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: ALL_PER_PAGE,
            filter: String::new(),
            server_version: String::new(),
            enterprise_plugins: false,
            cloud: false,
            platform: String::new(),
            plugin_id: String::new(),
            return_all_versions: false,
        }
    }
}

impl PluginFilter {
    /// Reject page values the query algorithm cannot slice by
    pub fn validate(&self) -> Result<()> {
        if self.page < 0 {
            return Err(CatalogError::invalid_filter(format!(
                "page must not be negative, got {}",
                self.page
            )));
        }
        if self.per_page < ALL_PER_PAGE {
            return Err(CatalogError::invalid_filter(format!(
                "per_page must be {ALL_PER_PAGE} or greater, got {}",
                self.per_page
            )));
        }
        Ok(())
    }

    /// Whether the filter asks for every match in a single page
    pub fn is_unpaged(&self) -> bool {
        self.per_page == ALL_PER_PAGE
    }

    /// Build a filter from raw wire parameters
    ///
    /// Absent or empty values take their defaults (`page=0`, `per_page=100`,
    /// empty strings, `false`). Values that are present but do not parse are
    /// an [`CatalogError::InvalidFilter`].
    pub fn from_query(query: &PluginQuery) -> Result<Self> {
        Ok(Self {
            page: parse_int("page", query.page.as_deref(), 0)?,
            per_page: parse_int("per_page", query.per_page.as_deref(), DEFAULT_PER_PAGE)?,
            filter: query.filter.clone().unwrap_or_default(),
            server_version: query.server_version.clone().unwrap_or_default(),
            enterprise_plugins: parse_bool(
                "enterprise_plugins",
                query.enterprise_plugins.as_deref(),
            )?,
            cloud: parse_bool("cloud", query.cloud.as_deref())?,
            platform: query.platform.clone().unwrap_or_default(),
            plugin_id: query.plugin_id.clone().unwrap_or_default(),
            return_all_versions: parse_bool(
                "return_all_versions",
                query.return_all_versions.as_deref(),
            )?,
        })
    }

    /// Encode the filter as wire parameters for a remote marketplace
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("filter", self.filter.clone()),
            ("server_version", self.server_version.clone()),
            ("enterprise_plugins", self.enterprise_plugins.to_string()),
            ("cloud", self.cloud.to_string()),
            ("platform", self.platform.clone()),
            ("return_all_versions", self.return_all_versions.to_string()),
            ("plugin_id", self.plugin_id.clone()),
        ]
    }
}

/// Raw query string parameters, before any parsing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub filter: Option<String>,
    pub server_version: Option<String>,
    pub enterprise_plugins: Option<String>,
    pub cloud: Option<String>,
    pub platform: Option<String>,
    pub plugin_id: Option<String>,
    pub return_all_versions: Option<String>,
}

fn parse_int(name: &str, value: Option<&str>, default: i64) -> Result<i64> {
    match value {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            CatalogError::invalid_filter(format!("failed to parse {name} as integer: {raw:?}"))
        }),
    }
}

fn parse_bool(name: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("") => Ok(false),
        Some("1" | "t" | "T" | "true" | "TRUE" | "True") => Ok(true),
        Some("0" | "f" | "F" | "false" | "FALSE" | "False") => Ok(false),
        Some(raw) => Err(CatalogError::invalid_filter(format!(
            "failed to parse {name} as boolean: {raw:?}"
        ))),
    }
}
