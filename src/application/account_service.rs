// Account service - discovers which accounts report Kafka entities per provider
use crate::application::provider_registry::ProviderRegistry;
use crate::application::query_executor::{EntitySearchQuery, EntitySearchResult, QueryExecutor};
use crate::domain::provider::{EntityType, ProviderId};
use crate::error::{KafkaViewError, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAccounts {
    pub provider_id: ProviderId,
    #[serde(flatten)]
    pub search: EntitySearchResult,
}

#[derive(Clone)]
pub struct AccountService {
    registry: Arc<ProviderRegistry>,
    executor: Arc<dyn QueryExecutor>,
}

impl AccountService {
    pub fn new(registry: Arc<ProviderRegistry>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { registry, executor }
    }

    /// Accounts with at least one cluster entity for the provider.
    pub async fn discover(&self, provider: ProviderId) -> Result<ProviderAccounts> {
        let descriptor = self.registry.describe(provider)?;
        let Some(search_type) = descriptor.search_types.get(&EntityType::Cluster) else {
            return Ok(ProviderAccounts {
                provider_id: provider,
                search: EntitySearchResult::default(),
            });
        };

        let query = EntitySearchQuery::infra(search_type);
        tracing::debug!("Entity search for {}: {}", provider, query.predicate());

        let search = self
            .executor
            .search_entities(&query)
            .await
            .map_err(|e| KafkaViewError::QueryExecutionFailure {
                provider,
                message: format!("{e:#}"),
            })?;

        Ok(ProviderAccounts {
            provider_id: provider,
            search,
        })
    }

    /// Discovery for every enabled provider; one failing provider does not hide the others.
    pub async fn discover_all(&self) -> Vec<Result<ProviderAccounts>> {
        let providers = self.registry.provider_ids();
        join_all(providers.into_iter().map(|p| self.discover(p))).await
    }
}
