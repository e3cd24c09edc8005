//! Plugin release records and registry snapshot decoding
//!
//! A [`Plugin`] is one published version of one plugin. Field names are the
//! JSON wire contract shared by the registry file, the HTTP API and upstream
//! marketplaces, so they must not be renamed.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

use super::label::Label;
use crate::error::{CatalogError, Result};
use crate::version::PluginVersion;

const MIN_PLUGIN_ID_LENGTH: usize = 3;
const MAX_PLUGIN_ID_LENGTH: usize = 190;

static PLUGIN_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_.]+$").expect("plugin id pattern is valid"));

/// Which deployments a plugin may be offered to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostingRestriction {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "cloud")]
    CloudOnly,
    #[serde(rename = "on-prem")]
    OnPremOnly,
}

impl HostingRestriction {
    /// Whether a server on the given side of the cloud/on-prem split may receive the plugin
    pub fn allows(self, cloud: bool) -> bool {
        match self {
            HostingRestriction::None => true,
            HostingRestriction::CloudOnly => cloud,
            HostingRestriction::OnPremOnly => !cloud,
        }
    }
}

/// Who maintains a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    Mattermost,
    Partner,
    Community,
}

/// Maturity of a plugin release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStage {
    #[default]
    #[serde(alias = "")]
    Production,
    Beta,
}

/// A platform-specific bundle that replaces the default download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformArtifact {
    #[serde(default)]
    pub download_url: String,

    /// Base64-encoded signature of the bundle
    #[serde(default)]
    pub signature: String,
}

impl PlatformArtifact {
    /// An override is only usable when both the bundle and its signature are known
    pub fn is_usable(&self) -> bool {
        !self.download_url.is_empty() && !self.signature.is_empty()
    }
}

/// The plugin manifest as published with a release
///
/// Only the fields the catalog reasons about are typed; everything else the
/// manifest carries is kept verbatim in `extra` so it survives a round trip
/// through a proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub support_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_notes_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_path: String,

    #[serde(default)]
    pub version: String,

    /// Lowest server version the release runs on; empty means any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_server_version: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Registries written by older services carry `null` for empty lists and maps
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An empty string means the field is unset
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => T::deserialize(value.into_deserializer()).map(Some),
    }
}

/// One published version of one plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    #[serde(default)]
    pub homepage_url: String,

    #[serde(default)]
    pub icon_data: String,

    /// Default bundle, used when no platform override applies
    #[serde(default)]
    pub download_url: String,

    #[serde(default)]
    pub release_notes_url: String,

    /// Display labels; recomputed from the classification fields before serving
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub hosting: HostingRestriction,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_type: Option<AuthorType>,

    #[serde(default)]
    pub release_stage: ReleaseStage,

    /// Only offered to servers that opt into enterprise plugins
    #[serde(default)]
    pub enterprise: bool,

    /// Base64-encoded signature of the default bundle
    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub manifest: Option<Manifest>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub platforms: BTreeMap<String, PlatformArtifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Plugin {
    /// Plugin id, or the empty string when the manifest is missing
    pub fn id(&self) -> &str {
        self.manifest.as_ref().map_or("", |m| m.id.as_str())
    }

    pub fn name(&self) -> &str {
        self.manifest.as_ref().map_or("", |m| m.name.as_str())
    }

    pub fn description(&self) -> &str {
        self.manifest.as_ref().map_or("", |m| m.description.as_str())
    }

    pub fn version(&self) -> &str {
        self.manifest.as_ref().map_or("", |m| m.version.as_str())
    }

    pub fn min_server_version(&self) -> &str {
        self.manifest
            .as_ref()
            .map_or("", |m| m.min_server_version.as_str())
    }

    /// Check the invariants every catalog relies on
    ///
    /// The manifest must be present with a well-formed id and a semantic
    /// version. A minimum server version, when given, must parse as well.
    pub fn validate(&self) -> Result<()> {
        let manifest = self
            .manifest
            .as_ref()
            .ok_or_else(|| CatalogError::invalid_plugin("", "missing manifest"))?;

        let id = manifest.id.as_str();
        if id.is_empty() {
            return Err(CatalogError::invalid_plugin(id, "missing id in manifest"));
        }
        if id.len() < MIN_PLUGIN_ID_LENGTH || id.len() > MAX_PLUGIN_ID_LENGTH {
            return Err(CatalogError::invalid_plugin(
                id,
                format!(
                    "id must be between {MIN_PLUGIN_ID_LENGTH} and {MAX_PLUGIN_ID_LENGTH} characters"
                ),
            ));
        }
        if !PLUGIN_ID_PATTERN.is_match(id) {
            return Err(CatalogError::invalid_plugin(
                id,
                "id may only contain letters, digits, '-', '_' and '.'",
            ));
        }

        if manifest.version.is_empty() {
            return Err(CatalogError::invalid_plugin(id, "missing version in manifest"));
        }
        PluginVersion::parse(&manifest.version)
            .map_err(|e| CatalogError::invalid_plugin(id, e.to_string()))?;

        if !manifest.min_server_version.is_empty() {
            PluginVersion::parse(&manifest.min_server_version).map_err(|e| {
                CatalogError::invalid_plugin(id, format!("min_server_version: {e}"))
            })?;
        }

        Ok(())
    }

    /// The platform override to serve for `platform`, if one is usable
    pub fn artifact_for(&self, platform: &str) -> Option<&PlatformArtifact> {
        if platform.is_empty() {
            return None;
        }
        self.platforms.get(platform).filter(|a| a.is_usable())
    }

    /// Point this copy's download at the bundle for `platform`
    ///
    /// Takes the record by value so the shared catalog entry is never touched.
    /// Unknown platforms or incomplete overrides leave the default bundle in place.
    pub fn for_platform(mut self, platform: &str) -> Self {
        if let Some(artifact) = self.artifact_for(platform).cloned() {
            self.download_url = artifact.download_url;
            self.signature = artifact.signature;
        }
        self
    }
}

/// Decode a registry snapshot from a reader
///
/// An empty stream is an empty registry; anything else must be a JSON array.
pub fn plugins_from_reader(mut reader: impl Read) -> Result<Vec<Plugin>> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|source| CatalogError::Io {
            path: "<registry stream>".into(),
            source,
        })?;
    plugins_from_slice(&buffer)
}

/// Decode a registry snapshot from bytes; empty input or `null` yields no records
pub fn plugins_from_slice(bytes: &[u8]) -> Result<Vec<Plugin>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let plugins: Option<Vec<Plugin>> = serde_json::from_slice(bytes)
        .map_err(|source| CatalogError::MalformedRegistry { source })?;
    Ok(plugins.unwrap_or_default())
}
