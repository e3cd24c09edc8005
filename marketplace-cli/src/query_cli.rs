//! Query and label commands
//!
//! Run the same query the HTTP API answers, without starting a server.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use marketplace_core::model::{all_labels, derive_labels, HostingRestriction, Plugin};
use marketplace_core::{Catalog, PluginFilter, ALL_PER_PAGE};

use crate::{build_catalog, load_config};

/// Query a registry snapshot, optionally merged with upstream marketplaces
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Registry snapshot to query
    #[clap(long, default_value = "plugins.json")]
    database: PathBuf,

    /// Upstream marketplace to merge after the local registry (repeatable)
    #[clap(long = "upstream")]
    upstreams: Vec<String>,

    /// Configuration file supplying catalog settings
    #[clap(long)]
    config: Option<PathBuf>,

    /// Free-text search over id, name and description
    #[clap(long)]
    filter: Option<String>,

    /// Version of the requesting server
    #[clap(long)]
    server_version: Option<String>,

    /// Include enterprise-only plugins
    #[clap(long)]
    enterprise: bool,

    /// Query as a cloud-hosted server
    #[clap(long)]
    cloud: bool,

    /// Platform key, e.g. linux-amd64
    #[clap(long)]
    platform: Option<String>,

    /// Restrict results to one plugin id
    #[clap(long)]
    plugin_id: Option<String>,

    /// Return every eligible version, not just the latest
    #[clap(long)]
    all_versions: bool,

    /// Page to return, starting at 0
    #[clap(long, default_value_t = 0)]
    page: i64,

    /// Page size; -1 returns every match
    #[clap(long, default_value_t = ALL_PER_PAGE, allow_negative_numbers = true)]
    per_page: i64,

    /// Output results as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Min Server")]
    min_server_version: String,
    #[tabled(rename = "Hosting")]
    hosting: String,
    #[tabled(rename = "Download")]
    download_url: String,
}

impl From<&Plugin> for PluginRow {
    fn from(plugin: &Plugin) -> Self {
        let hosting = match plugin.hosting {
            HostingRestriction::None => "any",
            HostingRestriction::CloudOnly => "cloud",
            HostingRestriction::OnPremOnly => "on-prem",
        };

        PluginRow {
            id: plugin.id().to_string(),
            name: plugin.name().to_string(),
            version: plugin.version().to_string(),
            min_server_version: plugin.min_server_version().to_string(),
            hosting: hosting.to_string(),
            download_url: plugin.download_url.clone(),
        }
    }
}

impl QueryCommand {
    fn to_filter(&self) -> PluginFilter {
        PluginFilter {
            page: self.page,
            per_page: self.per_page,
            filter: self.filter.clone().unwrap_or_default(),
            server_version: self.server_version.clone().unwrap_or_default(),
            enterprise_plugins: self.enterprise,
            cloud: self.cloud,
            platform: self.platform.clone().unwrap_or_default(),
            plugin_id: self.plugin_id.clone().unwrap_or_default(),
            return_all_versions: self.all_versions,
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.clone())?;
        let catalog = build_catalog(
            &self.database,
            &self.upstreams,
            config.upstream_timeout(),
            &config.catalog,
        )?;

        let filter = self.to_filter();
        let mut plugins = catalog
            .get_plugins(&filter)
            .await
            .context("Failed to query plugins")?;
        for plugin in &mut plugins {
            plugin.labels = derive_labels(plugin);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plugins)?);
            return Ok(());
        }

        if plugins.is_empty() {
            println!("\nNo plugins found.");
            return Ok(());
        }

        println!("\nFound {} plugin(s):\n", plugins.len());
        let rows: Vec<PluginRow> = plugins.iter().map(PluginRow::from).collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{table}");

        Ok(())
    }
}

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "URL")]
    url: String,
}

/// Print every label the marketplace can attach to a plugin
#[derive(Args, Debug)]
pub struct LabelsCommand {
    /// Output as JSON
    #[clap(long)]
    json: bool,
}

impl LabelsCommand {
    pub fn execute(self) -> Result<()> {
        let labels = all_labels();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&labels)?);
            return Ok(());
        }

        let rows: Vec<LabelRow> = labels
            .into_iter()
            .map(|label| LabelRow {
                name: label.name,
                description: label.description,
                url: label.url,
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{table}");

        Ok(())
    }
}

#[cfg(test)]
mod query_cli_tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[clap(flatten)]
        query: QueryCommand,
    }

    #[test]
    fn test_defaults_return_everything() {
        let wrapper = Wrapper::parse_from(["query"]);
        let filter = wrapper.query.to_filter();
        assert_eq!(filter, PluginFilter::default());
    }

    #[test]
    fn test_flags_map_to_filter() {
        let wrapper = Wrapper::parse_from([
            "query",
            "--filter",
            "jira",
            "--server-version",
            "5.30.0",
            "--enterprise",
            "--cloud",
            "--platform",
            "linux-amd64",
            "--plugin-id",
            "jira",
            "--all-versions",
            "--page",
            "1",
            "--per-page",
            "10",
        ]);
        let filter = wrapper.query.to_filter();

        assert_eq!(filter.filter, "jira");
        assert_eq!(filter.server_version, "5.30.0");
        assert!(filter.enterprise_plugins);
        assert!(filter.cloud);
        assert_eq!(filter.platform, "linux-amd64");
        assert_eq!(filter.plugin_id, "jira");
        assert!(filter.return_all_versions);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.per_page, 10);
    }

    #[test]
    fn test_negative_per_page_is_accepted() {
        let wrapper = Wrapper::parse_from(["query", "--per-page", "-1"]);
        assert_eq!(wrapper.query.to_filter().per_page, ALL_PER_PAGE);
    }

    #[test]
    fn test_row_rendering() {
        let plugin: Plugin = serde_json::from_str(
            r#"{"download_url":"https://example.com/demo.tar.gz","hosting":"cloud",
                "manifest":{"id":"demo","name":"Demo","version":"1.0.0","min_server_version":"5.20.0"}}"#,
        )
        .unwrap();

        let row = PluginRow::from(&plugin);
        assert_eq!(row.id, "demo");
        assert_eq!(row.hosting, "cloud");
        assert_eq!(row.min_server_version, "5.20.0");
    }
}
