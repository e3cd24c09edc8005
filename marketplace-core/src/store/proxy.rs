//! Catalog that forwards queries to a remote marketplace
//!
//! The remote side speaks the same `GET /api/v1/plugins` contract this crate
//! serves. No local filtering, caching or retry happens here.

use async_trait::async_trait;
use std::time::Duration;

use super::Catalog;
use crate::error::{CatalogError, Result};
use crate::model::{Plugin, PluginFilter};

/// Catalog backed by a remote marketplace server
#[derive(Debug, Clone)]
pub struct ProxyCatalog {
    base_url: String,
    plugins_url: String,
    client: reqwest::Client,
}

impl ProxyCatalog {
    /// Create a proxy for the marketplace at `base_url`
    ///
    /// `timeout` bounds each whole request, including reading the body.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent(concat!("marketplace/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Upstream {
                url: base_url.clone(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            plugins_url: format!("{base_url}/api/v1/plugins"),
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Catalog for ProxyCatalog {
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        tracing::debug!("Querying upstream marketplace {}", self.plugins_url);

        let response = self
            .client
            .get(&self.plugins_url)
            .query(&filter.to_query_pairs())
            .send()
            .await
            .map_err(|e| CatalogError::Upstream {
                url: self.plugins_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UpstreamStatus {
                url: self.plugins_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| CatalogError::Upstream {
            url: self.plugins_url.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let plugins: Option<Vec<Plugin>> =
            serde_json::from_slice(&body).map_err(|source| CatalogError::UpstreamDecode {
                url: self.plugins_url.clone(),
                source,
            })?;
        let plugins = plugins.unwrap_or_default();

        tracing::debug!(
            "Upstream marketplace {} returned {} plugins",
            self.base_url,
            plugins.len()
        );
        Ok(plugins)
    }

    fn name(&self) -> String {
        format!("proxy {}", self.base_url)
    }
}

#[cfg(test)]
mod proxy_tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let proxy = ProxyCatalog::new("http://127.0.0.1:8085/", Duration::from_secs(5)).unwrap();
        assert_eq!(proxy.base_url(), "http://127.0.0.1:8085");
        assert_eq!(proxy.plugins_url, "http://127.0.0.1:8085/api/v1/plugins");
        assert_eq!(proxy.name(), "proxy http://127.0.0.1:8085");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let proxy = ProxyCatalog::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let err = proxy
            .get_plugins(&PluginFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Upstream { .. }));
    }
}
