//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern. Not every
//! test binary uses every helper.
#![allow(dead_code)]

use marketplace_core::api::{self, AppState};
use marketplace_core::model::{HostingRestriction, Manifest, PlatformArtifact};
use marketplace_core::{Catalog, CatalogConfig, Plugin, PluginFilter, ServiceInfo, StaticCatalog};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tokio::sync::oneshot;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A minimal valid release record
pub fn release(id: &str, name: &str, version: &str) -> Plugin {
    Plugin {
        homepage_url: format!("https://github.com/example/{id}"),
        download_url: format!("https://example.com/{id}-{version}.tar.gz"),
        signature: format!("sig-{id}-{version}"),
        manifest: Some(Manifest {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} plugin"),
            version: version.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn with_min_server_version(mut plugin: Plugin, min_server_version: &str) -> Plugin {
    if let Some(manifest) = plugin.manifest.as_mut() {
        manifest.min_server_version = min_server_version.to_string();
    }
    plugin
}

pub fn with_description(mut plugin: Plugin, description: &str) -> Plugin {
    if let Some(manifest) = plugin.manifest.as_mut() {
        manifest.description = description.to_string();
    }
    plugin
}

pub fn with_hosting(mut plugin: Plugin, hosting: HostingRestriction) -> Plugin {
    plugin.hosting = hosting;
    plugin
}

pub fn enterprise(mut plugin: Plugin) -> Plugin {
    plugin.enterprise = true;
    plugin
}

pub fn with_platform(mut plugin: Plugin, platform: &str, url: &str, signature: &str) -> Plugin {
    plugin.platforms.insert(
        platform.to_string(),
        PlatformArtifact {
            download_url: url.to_string(),
            signature: signature.to_string(),
        },
    );
    plugin
}

/// The two-version `demo` registry used throughout the compatibility tests
pub fn demo_registry() -> Vec<Plugin> {
    vec![
        with_min_server_version(release("demo", "Demo", "0.1.0"), "5.14.0"),
        with_min_server_version(release("demo", "Demo", "0.2.0"), "5.15.0"),
    ]
}

pub fn static_catalog(plugins: Vec<Plugin>) -> StaticCatalog {
    StaticCatalog::new(plugins, &CatalogConfig::default()).expect("test registry is valid")
}

pub fn filter() -> PluginFilter {
    PluginFilter::default()
}

pub fn ids(plugins: &[Plugin]) -> Vec<&str> {
    plugins.iter().map(|p| p.id()).collect()
}

pub fn ids_and_versions(plugins: &[Plugin]) -> Vec<(&str, &str)> {
    plugins.iter().map(|p| (p.id(), p.version())).collect()
}

/// Write plugins to a registry file in `dir`
pub fn write_registry(dir: &Path, plugins: &[Plugin]) -> PathBuf {
    let path = dir.join("plugins.json");
    let json = serde_json::to_vec_pretty(plugins).expect("plugins serialize");
    std::fs::write(&path, json).expect("registry written");
    path
}

/// A marketplace served on an ephemeral port, shut down on drop
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve the real API router over `catalog`
pub async fn spawn_marketplace(catalog: Arc<dyn Catalog>) -> TestServer {
    spawn_router(api::router(AppState::new(catalog, ServiceInfo::default()))).await
}

/// Serve an arbitrary router, used for upstreams that misbehave
pub async fn spawn_router(router: axum::Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        addr,
        shutdown: Some(tx),
    }
}
