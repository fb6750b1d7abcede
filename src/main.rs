// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::dashboard_service::DashboardService;
use crate::application::installer::TemplateInstaller;
use crate::application::layout_engine::LayoutEngine;
use crate::application::record_service::RecordService;
use crate::infrastructure::config::load_server_config;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::template_catalog::StaticTemplateCatalog;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_component, create_dashboard, create_record, delete_component, delete_dashboard,
    delete_record, get_dashboard, health_check, install_catalog_template, install_template,
    list_records, put_layout, put_schema, render_component, update_dashboard, update_record,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_server_config()?;

    // Create store and catalog (infrastructure layer)
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(StaticTemplateCatalog::builtin());

    // Create services (application layer)
    let dashboards = DashboardService::new(store.clone());
    let records = RecordService::new(store.clone());
    let layout = LayoutEngine::new(
        store.clone(),
        Duration::from_millis(config.layout.debounce_ms),
    );
    let installer = TemplateInstaller::new(store, catalog);

    // Create application state
    let state = Arc::new(AppState {
        dashboards,
        records,
        layout: layout.clone(),
        installer,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", post(create_dashboard))
        .route(
            "/dashboards/:slug",
            get(get_dashboard)
                .put(update_dashboard)
                .delete(delete_dashboard),
        )
        .route("/dashboards/:slug/components", post(add_component))
        .route(
            "/dashboards/:slug/components/:id",
            axum::routing::delete(delete_component),
        )
        .route("/dashboards/:slug/components/:id/schema", put(put_schema))
        .route(
            "/dashboards/:slug/components/:id/render",
            get(render_component),
        )
        .route("/dashboards/:slug/layout", put(put_layout))
        .route(
            "/components/:id/records",
            post(create_record).get(list_records),
        )
        .route("/records/:id", put(update_record).delete(delete_record))
        .route("/templates/install", post(install_template))
        .route("/templates/:id/install", post(install_catalog_template))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("starting gridboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Editing sessions may have layout changes inside the debounce
    // window; issue them before exiting.
    layout.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
