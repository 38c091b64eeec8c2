// HTTP request handlers
use crate::application::account_service::ProviderAccounts;
use crate::application::overview_service::OverviewRequest;
use crate::domain::provider::{EntityType, ProviderId};
use crate::domain::table::{AssembledTable, ProviderErrorFlag};
use crate::error::Result;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AccountsQuery {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub uses_metric_stream: bool,
    pub entity_types: Vec<EntityType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsResponse {
    pub providers: Vec<ProviderAccounts>,
    pub provider_errors: Vec<ProviderErrorFlag>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Enabled providers and the entity types each one reports
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ProviderSummary>>> {
    let mut summaries = Vec::new();
    for id in state.registry.provider_ids() {
        let descriptor = state.registry.describe(id)?;
        let mut entity_types: Vec<EntityType> = descriptor.event_types.keys().copied().collect();
        entity_types.sort();

        summaries.push(ProviderSummary {
            id,
            display_name: id.display_name(),
            uses_metric_stream: descriptor.uses_metric_stream,
            entity_types,
        });
    }
    Ok(Json(summaries))
}

/// Accounts reporting Kafka entities, for one provider or all of them
pub async fn list_accounts(
    Query(query): Query<AccountsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountsResponse>> {
    if let Some(provider) = query.provider {
        let provider: ProviderId = provider.parse()?;
        let accounts = state.account_service.discover(provider).await?;
        return Ok(Json(AccountsResponse {
            providers: vec![accounts],
            provider_errors: Vec::new(),
        }));
    }

    let mut response = AccountsResponse {
        providers: Vec::new(),
        provider_errors: Vec::new(),
    };
    for (provider_id, result) in state
        .registry
        .provider_ids()
        .into_iter()
        .zip(state.account_service.discover_all().await)
    {
        match result {
            Ok(accounts) => response.providers.push(accounts),
            Err(e) => {
                tracing::warn!("Account discovery failed for {}: {}", provider_id, e);
                response.provider_errors.push(ProviderErrorFlag {
                    provider_id,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(Json(response))
}

/// Multi-provider overview table
pub async fn load_overview(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OverviewRequest>,
) -> Result<Json<AssembledTable>> {
    let table = state.overview_service.load(request).await?;
    Ok(Json(table))
}
