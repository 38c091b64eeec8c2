// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::account_service::AccountService;
use crate::application::overview_service::OverviewService;
use crate::application::provider_registry::ProviderRegistry;
use crate::application::query_builder::{QueryDefaults, QuerySpecBuilder};
use crate::application::query_executor::QueryExecutor;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::nerdgraph_executor::NerdGraphExecutor;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, list_accounts, list_providers, load_overview};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kafka_overview=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Provider registry and executor (infrastructure layer)
    let registry = Arc::new(ProviderRegistry::new(&config.providers.enabled));
    let executor: Arc<dyn QueryExecutor> = Arc::new(NerdGraphExecutor::new(
        config.nerdgraph.endpoint.clone(),
        config.nerdgraph.api_key.clone(),
        Duration::from_secs(config.nerdgraph.timeout_secs),
    )?);

    // Create services (application layer)
    let builder = QuerySpecBuilder::new(registry.clone(), QueryDefaults::from(&config.query));
    let account_service = AccountService::new(registry.clone(), executor.clone());
    let overview_service = OverviewService::new(registry.clone(), builder, executor);

    let state = Arc::new(AppState {
        registry: registry.clone(),
        account_service,
        overview_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/providers", get(list_providers))
        .route("/accounts", get(list_accounts))
        .route("/overview", post(load_overview))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.listen_addr.parse()?;
    tracing::info!(
        "Starting kafka-overview on {} with providers {:?}",
        addr,
        registry.provider_ids()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
