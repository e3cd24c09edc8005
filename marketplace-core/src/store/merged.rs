//! Catalog that resolves several sources as one
//!
//! If a plugin is present in multiple sources, the newer version wins. If the
//! same version is present in multiple sources, the record from the source
//! registered later wins.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

use super::{Catalog, StaticCatalog};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::model::{Plugin, PluginFilter, ALL_PER_PAGE};

/// Merges the results of multiple catalogs
pub struct MergedCatalog {
    sources: Vec<Arc<dyn Catalog>>,
    config: CatalogConfig,
}

impl MergedCatalog {
    /// Sources are listed from least to most authoritative
    pub fn new(sources: Vec<Arc<dyn Catalog>>, config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { sources, config })
    }
}

#[async_trait]
impl Catalog for MergedCatalog {
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        match self.sources.as_slice() {
            [] => return Ok(Vec::new()),
            [only] => return only.get_plugins(filter).await,
            _ => {}
        }

        if filter.per_page == 0 {
            return Ok(Vec::new());
        }
        filter.validate()?;

        let everything = PluginFilter {
            page: 0,
            per_page: ALL_PER_PAGE,
            ..filter.clone()
        };

        let queries = self.sources.iter().enumerate().map(|(index, source)| {
            let everything = &everything;
            async move {
                tracing::debug!("Querying catalog source {} ({})", index, source.name());
                source
                    .get_plugins(everything)
                    .await
                    .map_err(|e| CatalogError::Source {
                        index,
                        source: Box::new(e),
                    })
            }
        });

        // try_join_all keeps results in source order
        let union: Vec<Plugin> = try_join_all(queries).await?.into_iter().flatten().collect();
        tracing::debug!(
            "Merging {} records from {} sources",
            union.len(),
            self.sources.len()
        );

        StaticCatalog::new(union, &self.config)?.query(filter)
    }

    fn name(&self) -> String {
        format!("merged ({} sources)", self.sources.len())
    }
}

#[cfg(test)]
mod merged_tests {
    use super::*;
    use crate::model::Manifest;

    struct FailingCatalog;

    #[async_trait]
    impl Catalog for FailingCatalog {
        async fn get_plugins(&self, _filter: &PluginFilter) -> Result<Vec<Plugin>> {
            Err(CatalogError::UpstreamStatus {
                url: "http://upstream.invalid/api/v1/plugins".to_string(),
                status: 503,
            })
        }

        fn name(&self) -> String {
            "failing".to_string()
        }
    }

    fn failing() -> Arc<dyn Catalog> {
        Arc::new(FailingCatalog)
    }

    fn catalog(plugins: Vec<Plugin>) -> Arc<dyn Catalog> {
        Arc::new(StaticCatalog::new(plugins, &CatalogConfig::default()).unwrap())
    }

    fn plugin(id: &str, version: &str) -> Plugin {
        Plugin {
            manifest: Some(Manifest {
                id: id.to_string(),
                name: id.to_string(),
                version: version.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_no_sources_is_empty() {
        let merged = MergedCatalog::new(Vec::new(), CatalogConfig::default()).unwrap();
        let result = merged.get_plugins(&PluginFilter::default()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_single_source_is_passed_through() {
        let merged = MergedCatalog::new(
            vec![catalog(vec![plugin("demo", "1.0.0")])],
            CatalogConfig::default(),
        )
        .unwrap();
        let result = merged.get_plugins(&PluginFilter::default()).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_source_fails_the_merge() {
        let merged = MergedCatalog::new(
            vec![catalog(vec![plugin("demo", "1.0.0")]), failing()],
            CatalogConfig::default(),
        )
        .unwrap();

        let err = merged
            .get_plugins(&PluginFilter::default())
            .await
            .unwrap_err();
        match err {
            CatalogError::Source { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(
                    *source,
                    CatalogError::UpstreamStatus { status: 503, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_zero_per_page_skips_sources() {
        let merged = MergedCatalog::new(
            vec![failing(), failing()],
            CatalogConfig::default(),
        )
        .unwrap();

        let filter = PluginFilter {
            per_page: 0,
            ..Default::default()
        };
        assert!(merged.get_plugins(&filter).await.unwrap().is_empty());
    }
}
