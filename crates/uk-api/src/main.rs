mod auth;
mod config;
mod dto;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use uk_state::LocalState;

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    // Instance store
    let store = LocalState::open(&config.state_file)
        .await
        .expect("failed to open instance state");

    // Providers
    let providers = uk_infra::build_providers(Arc::new(store))
        .await
        .expect("failed to build providers");
    tracing::info!(providers = ?providers.available(), "providers ready");

    let state = AppState {
        providers,
        config: config.clone(),
    };

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting instance API");

    axum::serve(listener, app).await.expect("server error");
}
