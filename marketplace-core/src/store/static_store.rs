//! In-memory catalog over a validated registry snapshot
//!
//! The snapshot is validated once at construction and never mutated
//! afterwards. Queries only read it, collecting references until the final
//! page is known, and hand out owned copies of that page.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use super::Catalog;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::model::{plugins_from_reader, Plugin, PluginFilter};
use crate::version::PluginVersion;

/// A record that passed the eligibility gates, with its parsed version
type Candidate<'a> = (&'a Plugin, PluginVersion);

/// Catalog backed by a fixed set of plugin records
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    plugins: Vec<Plugin>,
    enterprise_threshold: PluginVersion,
}

impl StaticCatalog {
    /// Build a catalog from records, rejecting the whole set if any record is invalid
    pub fn new(plugins: Vec<Plugin>, config: &CatalogConfig) -> Result<Self> {
        let enterprise_threshold = config.enterprise_threshold()?;

        for plugin in &plugins {
            plugin.validate()?;
        }

        tracing::debug!("Loaded static catalog: {} records", plugins.len());
        Ok(Self {
            plugins,
            enterprise_threshold,
        })
    }

    /// Build a catalog from a JSON registry stream
    pub fn from_reader(reader: impl Read, config: &CatalogConfig) -> Result<Self> {
        Self::new(plugins_from_reader(reader)?, config)
    }

    /// Build a catalog from a JSON registry file
    pub fn from_path(path: &Path, config: &CatalogConfig) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Reading registry snapshot from {}", path.display());
        Self::from_reader(std::io::BufReader::new(file), config)
    }

    /// Every record in the snapshot, in input order
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Number of records, counting every version
    pub fn version_count(&self) -> usize {
        self.plugins.len()
    }

    /// Number of distinct plugin ids
    pub fn plugin_count(&self) -> usize {
        self.plugins
            .iter()
            .map(Plugin::id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Run the query algorithm synchronously
    ///
    /// Eligibility gates run first, then latest-version collapsing, then the
    /// text and id filters, then sorting and pagination. Only the records on
    /// the returned page are copied, and platform substitution happens on
    /// those copies.
    pub fn query(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        if filter.per_page == 0 {
            return Ok(Vec::new());
        }
        filter.validate()?;

        let server_version = parse_server_version(&filter.server_version)?;

        let mut eligible = Vec::new();
        for plugin in &self.plugins {
            if self.is_eligible(plugin, filter, server_version.as_ref())? {
                eligible.push((plugin, record_version(plugin)?));
            }
        }

        let candidates = if filter.return_all_versions {
            eligible
        } else {
            latest_per_plugin(eligible)
        };

        let needle = filter.filter.trim().to_lowercase();
        let mut matches: Vec<Candidate<'_>> = candidates
            .into_iter()
            .filter(|(plugin, _)| needle.is_empty() || matches_text(plugin, &needle))
            .filter(|(plugin, _)| filter.plugin_id.is_empty() || plugin.id() == filter.plugin_id)
            .collect();

        sort_for_display(&mut matches);

        Ok(paginate(matches, filter)
            .into_iter()
            .map(|(plugin, _)| plugin.clone().for_platform(&filter.platform))
            .collect())
    }

    fn is_eligible(
        &self,
        plugin: &Plugin,
        filter: &PluginFilter,
        server_version: Option<&PluginVersion>,
    ) -> Result<bool> {
        // Servers older than the threshold never understood the enterprise
        // flag, so enterprise plugins stay visible to them.
        if plugin.enterprise && !filter.enterprise_plugins {
            if let Some(server_version) = server_version {
                if server_version.meets_minimum(&self.enterprise_threshold) {
                    return Ok(false);
                }
            }
        }

        if !plugin.hosting.allows(filter.cloud) {
            return Ok(false);
        }

        if let Some(server_version) = server_version {
            let min_server_version = plugin.min_server_version();
            if !min_server_version.is_empty() {
                let minimum = PluginVersion::parse(min_server_version).map_err(|e| {
                    CatalogError::invalid_plugin(plugin.id(), format!("min_server_version: {e}"))
                })?;
                if !server_version.meets_minimum(&minimum) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        self.query(filter)
    }

    fn name(&self) -> String {
        "static".to_string()
    }
}

fn parse_server_version(value: &str) -> Result<Option<PluginVersion>> {
    if value.is_empty() {
        return Ok(None);
    }
    match PluginVersion::parse(value) {
        Ok(version) => Ok(Some(version)),
        Err(CatalogError::InvalidVersion { value, source }) => {
            Err(CatalogError::InvalidServerVersion { value, source })
        }
        Err(e) => Err(e),
    }
}

fn record_version(plugin: &Plugin) -> Result<PluginVersion> {
    PluginVersion::parse(plugin.version())
        .map_err(|e| CatalogError::invalid_plugin(plugin.id(), e.to_string()))
}

/// Keep the highest version per id; on a tie the later record wins
///
/// Output order is the order in which each id first appeared.
fn latest_per_plugin(records: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    let mut latest: Vec<Candidate<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (plugin, version) in records {
        match positions.get(plugin.id()) {
            Some(&i) => {
                if version >= latest[i].1 {
                    latest[i] = (plugin, version);
                }
            }
            None => {
                positions.insert(plugin.id(), latest.len());
                latest.push((plugin, version));
            }
        }
    }

    latest
}

fn matches_text(plugin: &Plugin, needle: &str) -> bool {
    plugin.id().to_lowercase() == needle
        || plugin.name().to_lowercase().contains(needle)
        || plugin.description().to_lowercase().contains(needle)
}

/// Sort by the plugin's display name, then id, then newest version first
///
/// The display name of an id is taken from its newest record, so every
/// version of a plugin sorts together.
fn sort_for_display<'a>(records: &mut [Candidate<'a>]) {
    let mut newest: HashMap<&'a str, (&'a Plugin, PluginVersion)> = HashMap::new();
    for &(plugin, ref version) in records.iter() {
        match newest.get(plugin.id()) {
            Some((_, seen)) if seen >= version => {}
            _ => {
                newest.insert(plugin.id(), (plugin, version.clone()));
            }
        }
    }
    let display_names: HashMap<&'a str, String> = newest
        .into_iter()
        .map(|(id, (plugin, _))| (id, plugin.name().to_lowercase()))
        .collect();

    records.sort_by(|(a, a_version), (b, b_version)| {
        display_names[a.id()]
            .cmp(&display_names[b.id()])
            .then_with(|| a.id().cmp(b.id()))
            .then_with(|| b_version.cmp(a_version))
    });
}

fn paginate<T>(records: Vec<T>, filter: &PluginFilter) -> Vec<T> {
    if filter.is_unpaged() {
        return records;
    }

    let per_page = filter.per_page as usize;
    let start = (filter.page as usize).saturating_mul(per_page);
    if start >= records.len() {
        return Vec::new();
    }

    records.into_iter().skip(start).take(per_page).collect()
}
