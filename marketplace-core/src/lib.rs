//! Plugin marketplace catalog library exports
//!
//! Answers "which version of plugin X should server Y receive" over one or
//! more catalogs of published plugin releases.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod version;

pub use config::{CatalogConfig, ServerConfig, ServiceInfo};
pub use error::{CatalogError, Result};
pub use model::{Plugin, PluginFilter, ALL_PER_PAGE};
pub use store::{Catalog, MergedCatalog, ProxyCatalog, StaticCatalog};
pub use version::PluginVersion;
