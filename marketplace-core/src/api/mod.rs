//! HTTP surface exposing a catalog
//!
//! Routes:
//! - `GET /api/v1/plugins` - latest eligible plugins, filtered and paginated
//! - `GET /api/v1/plugin/{id}` - every eligible version of one plugin
//! - `GET /api/v1/labels` - the label catalogue
//! - `GET /api/v1/health` - service health and build information

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServiceInfo;
use crate::model::{all_labels, derive_labels, Label, Plugin, PluginFilter, PluginQuery};
use crate::store::Catalog;

mod error;

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, info: ServiceInfo) -> Self {
        Self {
            catalog,
            info: Arc::new(info),
        }
    }
}

/// Build the router with all API routes
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/plugins", get(get_plugins))
        .route("/plugin/{id}", get(get_plugin))
        .route("/labels", get(get_labels))
        .route("/health", get(health_check));

    Router::new().nest("/api/v1", api).with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Marketplace listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_plugins(
    State(state): State<AppState>,
    Query(query): Query<PluginQuery>,
) -> Result<Json<Vec<Plugin>>, ApiError> {
    let filter = PluginFilter::from_query(&query)?;
    query_catalog(&state, &filter).await
}

async fn get_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PluginQuery>,
) -> Result<Json<Vec<Plugin>>, ApiError> {
    let filter = PluginFilter {
        filter: String::new(),
        plugin_id: id,
        return_all_versions: true,
        ..PluginFilter::from_query(&query)?
    };
    query_catalog(&state, &filter).await
}

async fn query_catalog(state: &AppState, filter: &PluginFilter) -> Result<Json<Vec<Plugin>>, ApiError> {
    let mut plugins = state.catalog.get_plugins(filter).await?;
    for plugin in &mut plugins {
        plugin.labels = derive_labels(plugin);
    }

    tracing::debug!(
        page = filter.page,
        per_page = filter.per_page,
        plugin_id = %filter.plugin_id,
        "Returning {} plugins",
        plugins.len()
    );
    Ok(Json(plugins))
}

async fn get_labels() -> Json<Vec<Label>> {
    Json(all_labels())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCheckResponse {
    status: &'static str,
    version: &'static str,
    #[serde(rename = "releaseID")]
    release_id: String,
    details: BTreeMap<&'static str, BTreeMap<&'static str, String>>,
    description: String,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let build_info = BTreeMap::from([
        ("buildHash", state.info.build_hash.clone()),
        ("buildHashShort", state.info.build_hash_short.clone()),
    ]);

    let response = HealthCheckResponse {
        status: "pass",
        version: "1",
        release_id: state.info.release_id.clone(),
        details: BTreeMap::from([("buildInfo", build_info)]),
        description: state.info.description.clone(),
    };

    (
        [(header::CONTENT_TYPE, "application/health+json")],
        Json(response),
    )
}
