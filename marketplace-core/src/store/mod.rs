//! Catalog sources - Abstraction over where plugin records come from
//!
//! Every source answers the same query contract:
//! - [`StaticCatalog`] (validated in-memory snapshot)
//! - [`ProxyCatalog`] (remote marketplace over HTTP)
//! - [`MergedCatalog`] (several sources resolved as one)

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Plugin, PluginFilter};

mod merged;
mod proxy;
mod static_store;

pub use merged::MergedCatalog;
pub use proxy::ProxyCatalog;
pub use static_store::StaticCatalog;

/// Trait for plugin catalogs
///
/// Callers never mutate returned records; implementations hand out owned
/// copies so a query can never disturb the backing store.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Return the plugins matching `filter`, sorted and paginated
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>>;

    /// Source identifier for logging
    fn name(&self) -> String;
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        (**self).get_plugins(filter).await
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Box<T> {
    async fn get_plugins(&self, filter: &PluginFilter) -> Result<Vec<Plugin>> {
        (**self).get_plugins(filter).await
    }

    fn name(&self) -> String {
        (**self).name()
    }
}
